use anyhow::Context;
use sqlx::PgPool;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use schoolhub_auth::UserRole;
use schoolhub_core::{AppError, DomainError};
use schoolhub_models::subjects::{
    CreateSubjectDto, PaginatedSubjectsResponse, Subject, SubjectDetails, SubjectFilterParams,
    UpdateSubjectDto,
};

use crate::utils::integrity::{
    ensure_class_exists, ensure_user_role, find_class_summary, find_user_summary, like_pattern,
    map_unique_violation, order_clause,
};

const SUBJECT_COLUMNS: &str =
    "id, name, code, description, credits, class_id, teacher_id, created_at, updated_at";

const FILTER_CLAUSE: &str = r#"($1::uuid IS NULL OR class_id = $1)
      AND ($2::uuid IS NULL OR teacher_id = $2)
      AND ($3::text IS NULL OR name ILIKE $3 OR code ILIKE $3)"#;

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("name", "name"),
    ("code", "code"),
    ("credits", "credits"),
    ("created_at", "created_at"),
];

fn duplicate_code() -> DomainError {
    DomainError::conflict("A subject with this code already exists in the class")
}

pub struct SubjectService;

impl SubjectService {
    async fn ensure_code_free(
        db: &PgPool,
        code: &str,
        class_id: Uuid,
        exclude_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(
                   SELECT 1 FROM subjects
                   WHERE code = $1 AND class_id = $2 AND ($3::uuid IS NULL OR id <> $3))"#,
        )
        .bind(code)
        .bind(class_id)
        .bind(exclude_id)
        .fetch_one(db)
        .await
        .context("Failed to check subject code")?;

        if exists {
            return Err(duplicate_code().into());
        }
        Ok(())
    }

    async fn fetch_subject(db: &PgPool, id: Uuid) -> Result<Subject, AppError> {
        let subject = sqlx::query_as::<_, Subject>(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch subject")?
        .ok_or(DomainError::NotFound("Subject"))?;
        Ok(subject)
    }

    #[instrument(skip(db, dto), fields(subject.code = %dto.code, db.operation = "INSERT", db.table = "subjects"))]
    pub async fn create_subject(db: &PgPool, dto: CreateSubjectDto) -> Result<Subject, AppError> {
        ensure_class_exists(db, dto.class_id).await?;
        ensure_user_role(db, dto.teacher_id, UserRole::Teacher).await?;

        let code = dto.code.trim().to_uppercase();
        Self::ensure_code_free(db, &code, dto.class_id, None).await?;

        let subject = sqlx::query_as::<_, Subject>(&format!(
            r#"INSERT INTO subjects (name, code, description, credits, class_id, teacher_id)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {SUBJECT_COLUMNS}"#
        ))
        .bind(dto.name.trim())
        .bind(&code)
        .bind(&dto.description)
        .bind(dto.credits)
        .bind(dto.class_id)
        .bind(dto.teacher_id)
        .fetch_one(db)
        .await
        .map_err(|e| map_unique_violation(e, duplicate_code()))?;

        info!(subject.id = %subject.id, class.id = %subject.class_id, "Subject created");
        Ok(subject)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "subjects"))]
    pub async fn list_subjects(
        db: &PgPool,
        filters: SubjectFilterParams,
    ) -> Result<PaginatedSubjectsResponse, AppError> {
        let search = like_pattern(filters.search.as_deref());

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM subjects WHERE {FILTER_CLAUSE}"))
                .bind(filters.class_id)
                .bind(filters.teacher_id)
                .bind(&search)
                .fetch_one(db)
                .await
                .context("Failed to count subjects")?;

        let order = order_clause(
            filters.sort_by.as_deref(),
            filters.sort_order,
            SORT_COLUMNS,
            "created_at",
        );
        let subjects = sqlx::query_as::<_, Subject>(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects WHERE {FILTER_CLAUSE} {order} LIMIT $4 OFFSET $5"
        ))
        .bind(filters.class_id)
        .bind(filters.teacher_id)
        .bind(&search)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch subjects")?;

        debug!(total, returned = subjects.len(), "Subjects fetched");

        Ok(PaginatedSubjectsResponse {
            data: subjects,
            meta: filters.pagination.meta(total),
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "subjects"))]
    pub async fn get_subject(db: &PgPool, id: Uuid) -> Result<SubjectDetails, AppError> {
        let subject = Self::fetch_subject(db, id).await?;
        let class = find_class_summary(db, subject.class_id).await?;
        let teacher = find_user_summary(db, subject.teacher_id).await?;

        Ok(SubjectDetails {
            subject,
            class,
            teacher,
        })
    }

    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "subjects"))]
    pub async fn update_subject(
        db: &PgPool,
        id: Uuid,
        dto: UpdateSubjectDto,
    ) -> Result<Subject, AppError> {
        let current = Self::fetch_subject(db, id).await?;

        if let Some(teacher_id) = dto.teacher_id
            && teacher_id != current.teacher_id
        {
            ensure_user_role(db, teacher_id, UserRole::Teacher).await?;
        }

        let code = dto.code.as_deref().map(|c| c.trim().to_uppercase());
        if let Some(code) = &code
            && *code != current.code
        {
            Self::ensure_code_free(db, code, current.class_id, Some(id)).await?;
        }

        let subject = sqlx::query_as::<_, Subject>(&format!(
            r#"UPDATE subjects SET
                   name = COALESCE($2, name),
                   code = COALESCE($3, code),
                   description = COALESCE($4, description),
                   credits = COALESCE($5, credits),
                   teacher_id = COALESCE($6, teacher_id),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {SUBJECT_COLUMNS}"#
        ))
        .bind(id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(code)
        .bind(&dto.description)
        .bind(dto.credits)
        .bind(dto.teacher_id)
        .fetch_one(db)
        .await
        .map_err(|e| map_unique_violation(e, duplicate_code()))?;

        info!(subject.id = %id, "Subject updated");
        Ok(subject)
    }

    /// Exams of the subject and enrollment links to it are removed with it.
    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "subjects"))]
    pub async fn delete_subject(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete subject")?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("Subject").into());
        }

        info!(subject.id = %id, "Subject deleted");
        Ok(())
    }
}
