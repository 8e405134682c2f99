use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use schoolhub_auth::UserRole;
use schoolhub_core::{AppError, DomainError};
use schoolhub_models::enrollments::{
    CreateEnrollmentDto, Enrollment, EnrollmentDetails, EnrollmentFilterParams,
    PaginatedEnrollmentsResponse, UpdateEnrollmentDto, dedup_subjects, ensure_subjects_in_class,
};

use crate::metrics::track_integrity_rejection;
use crate::utils::integrity::{
    class_subject_ids, ensure_class_exists, ensure_user_role, find_class_summary,
    find_subject_summaries, find_user_summary, map_unique_violation, order_clause,
};

const ENROLLMENT_SELECT: &str = r#"SELECT e.id, e.student_id, e.class_id, e.academic_year,
       e.status, e.enrollment_date,
       ARRAY(SELECT es.subject_id FROM enrollment_subjects es
             WHERE es.enrollment_id = e.id ORDER BY es.subject_id) AS subject_ids,
       e.created_at, e.updated_at
FROM enrollments e"#;

const FILTER_CLAUSE: &str = r#"($1::uuid IS NULL OR e.student_id = $1)
      AND ($2::uuid IS NULL OR e.class_id = $2)
      AND ($3::int IS NULL OR e.academic_year = $3)
      AND ($4::enrollment_status IS NULL OR e.status = $4)"#;

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("academic_year", "e.academic_year"),
    ("enrollment_date", "e.enrollment_date"),
    ("status", "e.status"),
    ("created_at", "e.created_at"),
];

fn duplicate_enrollment() -> DomainError {
    DomainError::conflict("Student is already enrolled in this class for this academic year")
}

pub struct EnrollmentService;

impl EnrollmentService {
    async fn fetch_enrollment(db: &PgPool, id: Uuid) -> Result<Enrollment, AppError> {
        let enrollment =
            sqlx::query_as::<_, Enrollment>(&format!("{ENROLLMENT_SELECT} WHERE e.id = $1"))
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to fetch enrollment")?
                .ok_or(DomainError::NotFound("Enrollment"))?;
        Ok(enrollment)
    }

    async fn ensure_valid_subjects(
        db: &PgPool,
        class_id: Uuid,
        subject_ids: &[Uuid],
    ) -> Result<(), AppError> {
        if subject_ids.is_empty() {
            return Ok(());
        }
        let class_subjects = class_subject_ids(db, class_id).await?;
        ensure_subjects_in_class(subject_ids, &class_subjects)
            .inspect_err(|_| track_integrity_rejection("enrollment"))?;
        Ok(())
    }

    async fn replace_subjects(
        tx: &mut Transaction<'_, Postgres>,
        enrollment_id: Uuid,
        subject_ids: &[Uuid],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM enrollment_subjects WHERE enrollment_id = $1")
            .bind(enrollment_id)
            .execute(&mut **tx)
            .await
            .context("Failed to clear enrollment subjects")?;

        sqlx::query(
            r#"INSERT INTO enrollment_subjects (enrollment_id, subject_id)
               SELECT $1, UNNEST($2::uuid[])"#,
        )
        .bind(enrollment_id)
        .bind(subject_ids)
        .execute(&mut **tx)
        .await
        .context("Failed to store enrollment subjects")?;
        Ok(())
    }

    #[instrument(skip(db, dto), fields(student.id = %dto.student_id, class.id = %dto.class_id, db.operation = "INSERT", db.table = "enrollments"))]
    pub async fn create_enrollment(
        db: &PgPool,
        dto: CreateEnrollmentDto,
    ) -> Result<Enrollment, AppError> {
        ensure_user_role(db, dto.student_id, UserRole::Student).await?;
        ensure_class_exists(db, dto.class_id).await?;

        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(
                   SELECT 1 FROM enrollments
                   WHERE student_id = $1 AND class_id = $2 AND academic_year = $3)"#,
        )
        .bind(dto.student_id)
        .bind(dto.class_id)
        .bind(dto.academic_year)
        .fetch_one(db)
        .await
        .context("Failed to check enrollment uniqueness")?;
        if exists {
            return Err(duplicate_enrollment().into());
        }

        let subject_ids = dedup_subjects(&dto.subject_ids);
        Self::ensure_valid_subjects(db, dto.class_id, &subject_ids).await?;

        let mut tx = db.begin().await.context("Failed to begin transaction")?;

        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO enrollments (student_id, class_id, academic_year, status, enrollment_date)
               VALUES ($1, $2, $3, $4, COALESCE($5, CURRENT_DATE))
               RETURNING id"#,
        )
        .bind(dto.student_id)
        .bind(dto.class_id)
        .bind(dto.academic_year)
        .bind(dto.status.unwrap_or_default())
        .bind(dto.enrollment_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, duplicate_enrollment()))?;

        Self::replace_subjects(&mut tx, id, &subject_ids).await?;
        tx.commit().await.context("Failed to commit transaction")?;

        info!(enrollment.id = %id, "Enrollment created");
        Self::fetch_enrollment(db, id).await
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "enrollments"))]
    pub async fn list_enrollments(
        db: &PgPool,
        filters: EnrollmentFilterParams,
    ) -> Result<PaginatedEnrollmentsResponse, AppError> {
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM enrollments e WHERE {FILTER_CLAUSE}"
        ))
        .bind(filters.student_id)
        .bind(filters.class_id)
        .bind(filters.academic_year)
        .bind(filters.status)
        .fetch_one(db)
        .await
        .context("Failed to count enrollments")?;

        let order = order_clause(
            filters.sort_by.as_deref(),
            filters.sort_order,
            SORT_COLUMNS,
            "e.created_at",
        );
        let enrollments = sqlx::query_as::<_, Enrollment>(&format!(
            "{ENROLLMENT_SELECT} WHERE {FILTER_CLAUSE} {order} LIMIT $5 OFFSET $6"
        ))
        .bind(filters.student_id)
        .bind(filters.class_id)
        .bind(filters.academic_year)
        .bind(filters.status)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch enrollments")?;

        debug!(total, returned = enrollments.len(), "Enrollments fetched");

        Ok(PaginatedEnrollmentsResponse {
            data: enrollments,
            meta: filters.pagination.meta(total),
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "enrollments"))]
    pub async fn get_enrollment(db: &PgPool, id: Uuid) -> Result<EnrollmentDetails, AppError> {
        let enrollment = Self::fetch_enrollment(db, id).await?;
        let student = find_user_summary(db, enrollment.student_id).await?;
        let class = find_class_summary(db, enrollment.class_id).await?;
        let subjects = find_subject_summaries(db, &enrollment.subject_ids).await?;

        Ok(EnrollmentDetails {
            enrollment,
            student,
            class,
            subjects,
        })
    }

    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "enrollments"))]
    pub async fn update_enrollment(
        db: &PgPool,
        id: Uuid,
        dto: UpdateEnrollmentDto,
    ) -> Result<Enrollment, AppError> {
        let current = Self::fetch_enrollment(db, id).await?;

        let subject_ids = dto.subject_ids.as_deref().map(dedup_subjects);
        if let Some(subject_ids) = &subject_ids {
            Self::ensure_valid_subjects(db, current.class_id, subject_ids).await?;
        }

        let mut tx = db.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"UPDATE enrollments SET
                   status = COALESCE($2, status),
                   enrollment_date = COALESCE($3, enrollment_date),
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(dto.status)
        .bind(dto.enrollment_date)
        .execute(&mut *tx)
        .await
        .context("Failed to update enrollment")?;

        if let Some(subject_ids) = &subject_ids {
            Self::replace_subjects(&mut tx, id, subject_ids).await?;
        }

        tx.commit().await.context("Failed to commit transaction")?;

        info!(enrollment.id = %id, "Enrollment updated");
        Self::fetch_enrollment(db, id).await
    }

    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "enrollments"))]
    pub async fn delete_enrollment(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete enrollment")?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("Enrollment").into());
        }

        info!(enrollment.id = %id, "Enrollment deleted");
        Ok(())
    }

    #[instrument(skip(db), fields(db.operation = "INSERT", db.table = "enrollment_subjects"))]
    pub async fn add_subject(
        db: &PgPool,
        id: Uuid,
        subject_id: Uuid,
    ) -> Result<Enrollment, AppError> {
        let enrollment = Self::fetch_enrollment(db, id).await?;

        let subject_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM subjects WHERE id = $1)")
                .bind(subject_id)
                .fetch_one(db)
                .await
                .context("Failed to fetch subject")?;
        if !subject_exists {
            return Err(DomainError::NotFound("Subject").into());
        }

        Self::ensure_valid_subjects(db, enrollment.class_id, &[subject_id]).await?;

        if enrollment.subject_ids.contains(&subject_id) {
            return Err(DomainError::AlreadyEnrolledInSubject.into());
        }

        sqlx::query("INSERT INTO enrollment_subjects (enrollment_id, subject_id) VALUES ($1, $2)")
            .bind(id)
            .bind(subject_id)
            .execute(db)
            .await
            .map_err(|e| map_unique_violation(e, DomainError::AlreadyEnrolledInSubject))?;

        info!(enrollment.id = %id, subject.id = %subject_id, "Subject added to enrollment");
        Self::fetch_enrollment(db, id).await
    }

    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "enrollment_subjects"))]
    pub async fn remove_subject(
        db: &PgPool,
        id: Uuid,
        subject_id: Uuid,
    ) -> Result<Enrollment, AppError> {
        Self::fetch_enrollment(db, id).await?;

        let removed = sqlx::query(
            "DELETE FROM enrollment_subjects WHERE enrollment_id = $1 AND subject_id = $2",
        )
        .bind(id)
        .bind(subject_id)
        .execute(db)
        .await
        .context("Failed to remove enrollment subject")?;

        if removed.rows_affected() == 0 {
            return Err(DomainError::rule("Student is not enrolled in this subject").into());
        }

        info!(enrollment.id = %id, subject.id = %subject_id, "Subject removed from enrollment");
        Self::fetch_enrollment(db, id).await
    }
}
