//! Development data seeding.
//!
//! Every seeded user gets an address under [`users::SEED_EMAIL_DOMAIN`] and
//! the shared password `password123`, so [`clear_seeded_data`] can remove
//! exactly what was generated.

pub mod classes;
pub mod models;
pub mod users;

use std::time::Instant;

use schoolhub_auth::UserRole;
use schoolhub_core::hash_password;
use schoolhub_models::classes::DEFAULT_CAPACITY;
use sqlx::PgPool;

pub use models::SeedConfig;

const SEED_PASSWORD: &str = "password123";

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.classes > 0 && config.teachers == 0 {
        return Err("At least one teacher is required to seed classes".into());
    }

    let start_time = Instant::now();
    println!("🌱 Seeding database...");

    let password_hash = hash_password(SEED_PASSWORD)
        .map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let mut tx = db.begin().await?;

    let teachers = users::generate_users(UserRole::Teacher, config.teachers, &password_hash);
    let teacher_ids = users::insert_users(&mut tx, &teachers).await?;
    println!("   ✓ {} teachers", teacher_ids.len());

    let students = users::generate_users(UserRole::Student, config.students, &password_hash);
    let student_ids = users::insert_users(&mut tx, &students).await?;
    println!("   ✓ {} students", student_ids.len());

    let class_seeds = classes::generate_classes(config.classes, &teacher_ids, config.academic_year);
    let class_ids = classes::insert_classes(&mut tx, &class_seeds).await?;
    println!("   ✓ {} classes", class_ids.len());

    let subjects =
        classes::insert_subjects(&mut tx, &class_ids, &teacher_ids, config.subjects_per_class)
            .await?;
    println!("   ✓ {} subjects", subjects);

    let placed = classes::assign_students(
        &mut tx,
        &class_ids,
        &student_ids,
        DEFAULT_CAPACITY as usize,
    )
    .await?;
    println!("   ✓ {} students placed in classes", placed);

    tx.commit().await?;

    println!(
        "\n✅ Seeding finished in {:?} (password for all seeded users: {})",
        start_time.elapsed(),
        SEED_PASSWORD
    );
    Ok(())
}

/// Removes seeded users and the classes they teach. Subjects, rosters and
/// everything hanging off those classes go with them.
pub async fn clear_seeded_data(db: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let pattern = format!("%@{}", users::SEED_EMAIL_DOMAIN);
    let mut tx = db.begin().await?;

    let classes = sqlx::query(
        "DELETE FROM classes WHERE teacher_id IN (SELECT id FROM users WHERE email LIKE $1)",
    )
    .bind(&pattern)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let users = sqlx::query("DELETE FROM users WHERE email LIKE $1")
        .bind(&pattern)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    println!("🗑️  Deleted {} classes and {} users", classes, users);
    Ok(())
}
