//! Fake classes, their subjects, and student rosters.

use fake::Fake;
use fake::faker::lorem::en::Word;
use schoolhub_models::classes::DEFAULT_CAPACITY;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::models::ClassSeed;

const SECTIONS: &[&str] = &["A", "B", "C", "D"];
const SUBJECT_NAMES: &[(&str, &str)] = &[
    ("Mathematics", "MATH"),
    ("English Language", "ENG"),
    ("Basic Science", "SCI"),
    ("Social Studies", "SOC"),
    ("Computer Studies", "CMP"),
    ("Fine Arts", "ART"),
];

/// Spreads classes over grades and sections, cycling through the teachers.
pub fn generate_classes(count: usize, teacher_ids: &[Uuid], academic_year: i32) -> Vec<ClassSeed> {
    if teacher_ids.is_empty() {
        return Vec::new();
    }
    (0..count)
        .map(|idx| {
            let block: String = Word().fake();
            ClassSeed {
                name: format!("Grade {}", idx / SECTIONS.len() + 1),
                section: SECTIONS[idx % SECTIONS.len()].to_string(),
                academic_year,
                teacher_id: teacher_ids[idx % teacher_ids.len()],
                capacity: DEFAULT_CAPACITY,
                room: format!("{}-{}", block.to_uppercase(), 100 + idx),
            }
        })
        .collect()
}

pub async fn insert_classes(
    tx: &mut Transaction<'_, Postgres>,
    classes: &[ClassSeed],
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    let mut ids = Vec::with_capacity(classes.len());
    for class in classes {
        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO classes (name, section, academic_year, teacher_id, capacity, room)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (name, section, academic_year) DO UPDATE SET updated_at = NOW()
               RETURNING id"#,
        )
        .bind(&class.name)
        .bind(&class.section)
        .bind(class.academic_year)
        .bind(class.teacher_id)
        .bind(class.capacity)
        .bind(&class.room)
        .fetch_one(&mut **tx)
        .await?;
        ids.push(id);
    }
    Ok(ids)
}

/// Adds `per_class` subjects to every class. Returns the number created.
pub async fn insert_subjects(
    tx: &mut Transaction<'_, Postgres>,
    class_ids: &[Uuid],
    teacher_ids: &[Uuid],
    per_class: usize,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut created = 0;
    for (class_idx, class_id) in class_ids.iter().enumerate() {
        for (subject_idx, &(name, code)) in SUBJECT_NAMES.iter().take(per_class).enumerate() {
            let teacher_id = teacher_ids[(class_idx + subject_idx) % teacher_ids.len()];
            let result = sqlx::query(
                r#"INSERT INTO subjects (name, code, credits, class_id, teacher_id)
                   VALUES ($1, $2, 3, $3, $4)
                   ON CONFLICT (code, class_id) DO NOTHING"#,
            )
            .bind(name)
            .bind(code)
            .bind(class_id)
            .bind(teacher_id)
            .execute(&mut **tx)
            .await?;
            created += result.rows_affected() as usize;
        }
    }
    Ok(created)
}

/// Places students into classes round-robin, never past a class's capacity.
/// Returns the number of students placed.
pub async fn assign_students(
    tx: &mut Transaction<'_, Postgres>,
    class_ids: &[Uuid],
    student_ids: &[Uuid],
    capacity: usize,
) -> Result<usize, Box<dyn std::error::Error>> {
    if class_ids.is_empty() {
        return Ok(0);
    }

    let mut placed = 0;
    for (idx, student_id) in student_ids.iter().enumerate() {
        if idx / class_ids.len() >= capacity {
            break;
        }
        let class_id = class_ids[idx % class_ids.len()];

        sqlx::query("INSERT INTO class_students (class_id, student_id) VALUES ($1, $2)")
            .bind(class_id)
            .bind(student_id)
            .execute(&mut **tx)
            .await?;
        sqlx::query("UPDATE users SET class_id = $1 WHERE id = $2")
            .bind(class_id)
            .bind(student_id)
            .execute(&mut **tx)
            .await?;
        placed += 1;
    }
    Ok(placed)
}
