use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use schoolhub::router::init_router;
use schoolhub::schoolhub_auth::{UserRole, create_access_token};
use schoolhub::schoolhub_config::{CorsConfig, EmailConfig, JwtConfig};
use schoolhub::schoolhub_core::hash_password;
use schoolhub::state::AppState;
use schoolhub::utils::email::Mailer;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        access_secret: "test-access-secret-at-least-32-characters".to_string(),
        refresh_secret: "test-refresh-secret-at-least-32-characters".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 604800,
    }
}

pub fn setup_test_app(pool: PgPool) -> Router {
    dotenvy::dotenv().ok();
    let mut email_config = EmailConfig::from_env();
    email_config.enabled = false;

    init_router(AppState {
        db: pool,
        jwt_config: test_jwt_config(),
        mailer: Mailer::new(email_config),
        cors_config: CorsConfig::from_env(),
    })
}

pub fn generate_unique_email() -> String {
    format!("test-{}@school.test", Uuid::new_v4())
}

pub async fn create_test_user(pool: &PgPool, role: UserRole) -> TestUser {
    let email = generate_unique_email();
    let password = "password123".to_string();
    let hashed = hash_password(&password).unwrap();

    let id: Uuid = sqlx::query_scalar(
        r#"INSERT INTO users (first_name, last_name, email, password_hash, role)
           VALUES ('Test', 'User', $1, $2, $3)
           RETURNING id"#,
    )
    .bind(&email)
    .bind(hashed)
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap();

    TestUser {
        id,
        email,
        password,
        role,
    }
}

/// Mints an access token without going through the login endpoint.
pub fn token_for(user: &TestUser) -> String {
    create_access_token(user.id, &user.email, user.role, &test_jwt_config()).unwrap()
}

#[allow(dead_code)]
pub async fn create_test_class(pool: &PgPool, teacher_id: Uuid, capacity: i32) -> Uuid {
    sqlx::query_scalar(
        r#"INSERT INTO classes (name, section, academic_year, teacher_id, capacity)
           VALUES ($1, 'A', 2024, $2, $3)
           RETURNING id"#,
    )
    .bind(format!("Grade {}", Uuid::new_v4()))
    .bind(teacher_id)
    .bind(capacity)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[allow(dead_code)]
pub async fn create_test_subject(pool: &PgPool, class_id: Uuid, teacher_id: Uuid, code: &str) -> Uuid {
    sqlx::query_scalar(
        r#"INSERT INTO subjects (name, code, class_id, teacher_id)
           VALUES ($1, $2, $3, $4)
           RETURNING id"#,
    )
    .bind(format!("Subject {}", code))
    .bind(code)
    .bind(class_id)
    .bind(teacher_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Sends one request through the router and decodes the JSON body.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
