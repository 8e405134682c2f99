//! Fake teacher and student accounts.

use fake::Fake;
use fake::faker::name::en::*;
use rayon::prelude::*;
use schoolhub_auth::UserRole;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::models::UserSeed;

/// Suffix shared by every seeded email so the data can be cleared later.
pub const SEED_EMAIL_DOMAIN: &str = "seed.schoolhub.test";

/// Generates `count` users of one role in parallel.
pub fn generate_users(role: UserRole, count: usize, password_hash: &str) -> Vec<UserSeed> {
    let prefix = role.as_str().to_lowercase();
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let email = format!(
                "{}.{}+{}{}@{}",
                first_name.to_lowercase(),
                last_name.to_lowercase(),
                prefix,
                idx,
                SEED_EMAIL_DOMAIN
            );

            UserSeed {
                first_name,
                last_name,
                email,
                password_hash: password_hash.to_string(),
                role,
            }
        })
        .collect()
}

/// Inserts users with one `UNNEST` statement per chunk and returns their ids
/// in input order.
pub async fn insert_users(
    tx: &mut Transaction<'_, Postgres>,
    users: &[UserSeed],
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    const BATCH_SIZE: usize = 1000;
    let mut ids = Vec::with_capacity(users.len());

    for chunk in users.chunks(BATCH_SIZE) {
        let first_names: Vec<&str> = chunk.iter().map(|u| u.first_name.as_str()).collect();
        let last_names: Vec<&str> = chunk.iter().map(|u| u.last_name.as_str()).collect();
        let emails: Vec<&str> = chunk.iter().map(|u| u.email.as_str()).collect();
        let hashes: Vec<&str> = chunk.iter().map(|u| u.password_hash.as_str()).collect();
        let roles: Vec<&str> = chunk.iter().map(|u| u.role.as_str()).collect();

        let chunk_ids: Vec<Uuid> = sqlx::query_scalar(
            r#"INSERT INTO users (first_name, last_name, email, password_hash, role)
               SELECT * FROM UNNEST($1::varchar[], $2::varchar[], $3::varchar[], $4::varchar[], $5::text[]::user_role[])
               RETURNING id"#,
        )
        .bind(&first_names)
        .bind(&last_names)
        .bind(&emails)
        .bind(&hashes)
        .bind(&roles)
        .fetch_all(&mut **tx)
        .await?;

        ids.extend(chunk_ids);
    }

    Ok(ids)
}
