mod common;

use axum::http::StatusCode;
use common::{
    create_test_class, create_test_subject, create_test_user, send, setup_test_app, token_for,
};
use schoolhub::schoolhub_auth::UserRole;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_create_enrollment_with_subjects(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let class_id = create_test_class(&pool, teacher.id, 30).await;
    let math = create_test_subject(&pool, class_id, teacher.id, "MATH").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(&token_for(&admin)),
        Some(json!({
            "student_id": student.id,
            "class_id": class_id,
            "academic_year": 2024,
            "subject_ids": [math, math]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "ACTIVE");
    assert_eq!(body["subject_ids"], json!([math]));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_enrollment_is_rejected(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let class_id = create_test_class(&pool, teacher.id, 30).await;
    let app = setup_test_app(pool);
    let token = token_for(&admin);
    let payload = json!({
        "student_id": student.id,
        "class_id": class_id,
        "academic_year": 2024
    });

    let (first, _) = send(&app, "POST", "/api/enrollments", Some(&token), Some(payload.clone())).await;
    let (second, body) = send(&app, "POST", "/api/enrollments", Some(&token), Some(payload)).await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Student is already enrolled in this class for this academic year"
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_enrollment_rejects_subject_from_other_class(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let class_id = create_test_class(&pool, teacher.id, 30).await;
    let other_class = create_test_class(&pool, teacher.id, 30).await;
    let foreign = create_test_subject(&pool, other_class, teacher.id, "ENG").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(&token_for(&admin)),
        Some(json!({
            "student_id": student.id,
            "class_id": class_id,
            "academic_year": 2024,
            "subject_ids": [foreign]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "All subjects must belong to the enrollment's class");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_enrollment_requires_student_role(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let class_id = create_test_class(&pool, teacher.id, 30).await;
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(&token_for(&admin)),
        Some(json!({
            "student_id": teacher.id,
            "class_id": class_id,
            "academic_year": 2024
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_add_and_remove_enrollment_subject(pool: PgPool) {
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let class_id = create_test_class(&pool, teacher.id, 30).await;
    let science = create_test_subject(&pool, class_id, teacher.id, "SCI").await;
    let app = setup_test_app(pool);
    let token = token_for(&admin);

    let (_, enrollment) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(&token),
        Some(json!({
            "student_id": student.id,
            "class_id": class_id,
            "academic_year": 2024
        })),
    )
    .await;
    let id = enrollment["id"].as_str().unwrap().to_string();
    let uri = format!("/api/enrollments/{}/subjects", id);

    let (status, body) =
        send(&app, "POST", &uri, Some(&token), Some(json!({ "subject_id": science }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject_ids"], json!([science]));

    let (status, body) =
        send(&app, "POST", &uri, Some(&token), Some(json!({ "subject_id": science }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Student is already enrolled in this subject");

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("{}/{}", uri, science),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject_ids"], json!([]));
}
