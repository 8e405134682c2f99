mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{create_test_user, generate_unique_email, send, setup_test_app, token_for};
use schoolhub::schoolhub_auth::UserRole;
use schoolhub::utils::reset_token;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_register_returns_tokens_and_user(pool: PgPool) {
    let app = setup_test_app(pool);
    let email = generate_unique_email();

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": email.to_uppercase(),
            "password": "password123",
            "first_name": "Ada",
            "last_name": "Obi"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["role"], "STUDENT");
    assert!(body["user"].get("password_hash").is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_register_duplicate_email(pool: PgPool) {
    let existing = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": existing.email,
            "password": "password123",
            "first_name": "Ada",
            "last_name": "Obi"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "A user with this email already exists");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_register_short_password(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": generate_unique_email(),
            "password": "short",
            "first_name": "Ada",
            "last_name": "Obi"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password must be at least 8 characters");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_success(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Teacher).await;
    let app = setup_test_app(pool.clone());

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": user.email, "password": user.password })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert_eq!(body["user"]["role"], "TEACHER");
    assert!(!body["user"]["last_login"].is_null());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_errors_do_not_reveal_which_part_failed(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool);

    let (unknown_status, unknown_body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@school.test", "password": "password123" })),
    )
    .await;
    let (wrong_status, wrong_body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": user.email, "password": "wrongpass123" })),
    )
    .await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_body, wrong_body);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_suspended_account(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Student).await;
    sqlx::query("UPDATE users SET status = 'SUSPENDED' WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": user.email, "password": user.password })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Account is not active");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_refresh_issues_new_pair(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool);

    let (_, login) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": user.email, "password": user.password })),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": login["refresh_token"] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_refresh_rejects_access_token(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": token_for(&user) })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_me_requires_token(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Parent).await;
    let app = setup_test_app(pool);

    let (status, _) = send(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token_for(&user)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user.id.to_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_forgot_password_same_message_for_unknown_email(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool.clone());

    let (known_status, known) = send(
        &app,
        "POST",
        "/api/auth/forgot-password",
        None,
        Some(json!({ "email": user.email })),
    )
    .await;
    let (unknown_status, unknown) = send(
        &app,
        "POST",
        "/api/auth/forgot-password",
        None,
        Some(json!({ "email": "ghost@school.test" })),
    )
    .await;

    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(unknown_status, StatusCode::OK);
    assert_eq!(known, unknown);

    let stored: Option<String> =
        sqlx::query_scalar("SELECT reset_token_hash FROM users WHERE id = $1")
            .bind(user.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(stored.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reset_password_with_valid_token(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Student).await;
    let token = reset_token::generate();
    sqlx::query(
        "UPDATE users SET reset_token_hash = $1, reset_token_expires = $2 WHERE id = $3",
    )
    .bind(&token.hash)
    .bind(token.expires_at)
    .bind(user.id)
    .execute(&pool)
    .await
    .unwrap();
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/reset-password",
        None,
        Some(json!({ "token": token.token, "new_password": "brandnew123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": user.email, "password": "brandnew123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/reset-password",
        None,
        Some(json!({ "token": token.token, "new_password": "another123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reset_password_with_expired_token(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Student).await;
    let raw = "expired-token";
    sqlx::query(
        "UPDATE users SET reset_token_hash = $1, reset_token_expires = $2 WHERE id = $3",
    )
    .bind(reset_token::hash(raw))
    .bind(Utc::now() - Duration::minutes(5))
    .bind(user.id)
    .execute(&pool)
    .await
    .unwrap();
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/reset-password",
        None,
        Some(json!({ "token": raw, "new_password": "brandnew123" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired reset token");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_change_password_requires_current(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Teacher).await;
    let app = setup_test_app(pool);
    let token = token_for(&user);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/change-password",
        Some(&token),
        Some(json!({ "current_password": "not-it-123", "new_password": "brandnew123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Current password is incorrect");

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/change-password",
        Some(&token),
        Some(json!({ "current_password": user.password, "new_password": "brandnew123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
