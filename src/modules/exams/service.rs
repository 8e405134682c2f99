use anyhow::Context;
use sqlx::PgPool;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use schoolhub_core::{AppError, DomainError};
use schoolhub_models::exams::{
    CreateExamDto, Exam, ExamDetails, ExamFilterParams, PaginatedExamsResponse, UpdateExamDto,
    ensure_positive_max_marks, ensure_subject_in_class,
};
use schoolhub_models::grades::letter_grade;
use schoolhub_models::subjects::SubjectSummary;

use crate::metrics::track_integrity_rejection;
use crate::utils::integrity::{
    ensure_class_exists, find_class_summary, find_user_summary, order_clause,
};

const EXAM_COLUMNS: &str = "id, title, description, class_id, subject_id, exam_date, max_marks, \
     duration, exam_type, status, created_by, created_at, updated_at";

const FILTER_CLAUSE: &str = r#"($1::uuid IS NULL OR class_id = $1)
      AND ($2::uuid IS NULL OR subject_id = $2)
      AND ($3::exam_status IS NULL OR status = $3)
      AND ($4::exam_type IS NULL OR exam_type = $4)"#;

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("title", "title"),
    ("exam_date", "exam_date"),
    ("max_marks", "max_marks"),
    ("status", "status"),
    ("created_at", "created_at"),
];

pub struct ExamService;

impl ExamService {
    async fn fetch_exam(db: &PgPool, id: Uuid) -> Result<Exam, AppError> {
        let exam = sqlx::query_as::<_, Exam>(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch exam")?
        .ok_or(DomainError::NotFound("Exam"))?;
        Ok(exam)
    }

    /// Class and subject must both exist and the subject must be taught in
    /// that class.
    async fn ensure_class_subject(
        db: &PgPool,
        class_id: Uuid,
        subject_id: Uuid,
    ) -> Result<(), AppError> {
        ensure_class_exists(db, class_id).await?;

        let subject_class: Uuid =
            sqlx::query_scalar("SELECT class_id FROM subjects WHERE id = $1")
                .bind(subject_id)
                .fetch_optional(db)
                .await
                .context("Failed to fetch subject")?
                .ok_or(DomainError::NotFound("Subject"))?;

        ensure_subject_in_class(subject_class, class_id)
            .inspect_err(|_| track_integrity_rejection("exam"))?;
        Ok(())
    }

    #[instrument(skip(db, dto), fields(exam.title = %dto.title, db.operation = "INSERT", db.table = "exams"))]
    pub async fn create_exam(
        db: &PgPool,
        dto: CreateExamDto,
        created_by: Uuid,
    ) -> Result<Exam, AppError> {
        Self::ensure_class_subject(db, dto.class_id, dto.subject_id).await?;
        ensure_positive_max_marks(dto.max_marks)?;

        let exam = sqlx::query_as::<_, Exam>(&format!(
            r#"INSERT INTO exams
                   (title, description, class_id, subject_id, exam_date, max_marks, duration,
                    exam_type, status, created_by)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               RETURNING {EXAM_COLUMNS}"#
        ))
        .bind(dto.title.trim())
        .bind(&dto.description)
        .bind(dto.class_id)
        .bind(dto.subject_id)
        .bind(dto.exam_date)
        .bind(dto.max_marks)
        .bind(dto.duration)
        .bind(dto.exam_type)
        .bind(dto.status.unwrap_or_default())
        .bind(created_by)
        .fetch_one(db)
        .await
        .context("Failed to insert exam")?;

        info!(exam.id = %exam.id, "Exam created");
        Ok(exam)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "exams"))]
    pub async fn list_exams(
        db: &PgPool,
        filters: ExamFilterParams,
    ) -> Result<PaginatedExamsResponse, AppError> {
        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM exams WHERE {FILTER_CLAUSE}"))
                .bind(filters.class_id)
                .bind(filters.subject_id)
                .bind(filters.status)
                .bind(filters.exam_type)
                .fetch_one(db)
                .await
                .context("Failed to count exams")?;

        let order = order_clause(
            filters.sort_by.as_deref(),
            filters.sort_order,
            SORT_COLUMNS,
            "exam_date",
        );
        let exams = sqlx::query_as::<_, Exam>(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams WHERE {FILTER_CLAUSE} {order} LIMIT $5 OFFSET $6"
        ))
        .bind(filters.class_id)
        .bind(filters.subject_id)
        .bind(filters.status)
        .bind(filters.exam_type)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch exams")?;

        debug!(total, returned = exams.len(), "Exams fetched");

        Ok(PaginatedExamsResponse {
            data: exams,
            meta: filters.pagination.meta(total),
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "exams"))]
    pub async fn get_exam(db: &PgPool, id: Uuid) -> Result<ExamDetails, AppError> {
        let exam = Self::fetch_exam(db, id).await?;
        let class = find_class_summary(db, exam.class_id).await?;
        let subject = sqlx::query_as::<_, SubjectSummary>(
            "SELECT id, name, code FROM subjects WHERE id = $1",
        )
        .bind(exam.subject_id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch exam subject")?;
        let creator = find_user_summary(db, exam.created_by).await?;

        Ok(ExamDetails {
            exam,
            class,
            subject,
            creator,
        })
    }

    /// A new maximum may not fall below marks already awarded. Existing
    /// letter grades are re-derived when the maximum changes.
    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "exams"))]
    pub async fn update_exam(db: &PgPool, id: Uuid, dto: UpdateExamDto) -> Result<Exam, AppError> {
        let current = Self::fetch_exam(db, id).await?;

        let class_id = dto.class_id.unwrap_or(current.class_id);
        let subject_id = dto.subject_id.unwrap_or(current.subject_id);
        if class_id != current.class_id || subject_id != current.subject_id {
            Self::ensure_class_subject(db, class_id, subject_id).await?;
        }

        let max_marks = dto.max_marks.unwrap_or(current.max_marks);
        ensure_positive_max_marks(max_marks)?;

        let grades: Vec<(Uuid, f64)> =
            sqlx::query_as("SELECT id, marks FROM grades WHERE exam_id = $1")
                .bind(id)
                .fetch_all(db)
                .await
                .context("Failed to fetch exam grades")?;

        let max_changed = max_marks != current.max_marks;
        if max_changed
            && let Some(highest) = grades.iter().map(|(_, marks)| *marks).reduce(f64::max)
            && highest > max_marks
        {
            track_integrity_rejection("exam");
            return Err(DomainError::rule(format!(
                "Maximum marks cannot be lower than an awarded mark ({})",
                highest
            ))
            .into());
        }

        let mut tx = db.begin().await.context("Failed to begin transaction")?;

        let exam = sqlx::query_as::<_, Exam>(&format!(
            r#"UPDATE exams SET
                   title = COALESCE($2, title),
                   description = COALESCE($3, description),
                   class_id = $4,
                   subject_id = $5,
                   exam_date = COALESCE($6, exam_date),
                   max_marks = $7,
                   duration = COALESCE($8, duration),
                   exam_type = COALESCE($9, exam_type),
                   status = COALESCE($10, status),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {EXAM_COLUMNS}"#
        ))
        .bind(id)
        .bind(dto.title.as_deref().map(str::trim))
        .bind(&dto.description)
        .bind(class_id)
        .bind(subject_id)
        .bind(dto.exam_date)
        .bind(max_marks)
        .bind(dto.duration)
        .bind(dto.exam_type)
        .bind(dto.status)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to update exam")?;

        if max_changed {
            for (grade_id, marks) in &grades {
                sqlx::query("UPDATE grades SET grade = $2, updated_at = NOW() WHERE id = $1")
                    .bind(grade_id)
                    .bind(letter_grade(*marks, max_marks))
                    .execute(&mut *tx)
                    .await
                    .context("Failed to re-derive letter grade")?;
            }
        }

        tx.commit().await.context("Failed to commit transaction")?;

        info!(exam.id = %id, regraded = max_changed, "Exam updated");
        Ok(exam)
    }

    /// Grades recorded for the exam are removed with it.
    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "exams"))]
    pub async fn delete_exam(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM exams WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete exam")?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("Exam").into());
        }

        info!(exam.id = %id, "Exam deleted");
        Ok(())
    }
}
