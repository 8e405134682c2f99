//! Admin account creation. Admins cannot self-register with elevated
//! privileges through any other path than the API's admin endpoints.

use schoolhub_auth::UserRole;
use schoolhub_core::hash_password;
use schoolhub_models::users::normalize_email;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create_admin(
    db: &PgPool,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
) -> Result<Uuid, Box<dyn std::error::Error>> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".into());
    }

    let password_hash =
        hash_password(password).map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let id: Option<Uuid> = sqlx::query_scalar(
        r#"INSERT INTO users (email, password_hash, first_name, last_name, role, status)
           VALUES ($1, $2, $3, $4, $5, 'ACTIVE')
           ON CONFLICT DO NOTHING
           RETURNING id"#,
    )
    .bind(normalize_email(email))
    .bind(password_hash)
    .bind(first_name.trim())
    .bind(last_name.trim())
    .bind(UserRole::Admin)
    .fetch_optional(db)
    .await?;

    id.ok_or_else(|| "User with this email already exists".into())
}
