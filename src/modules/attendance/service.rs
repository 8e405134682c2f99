use anyhow::Context;
use sqlx::PgPool;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use schoolhub_auth::UserRole;
use schoolhub_core::{AppError, DomainError};
use schoolhub_models::attendance::{
    Attendance, AttendanceDetails, AttendanceFilterParams, AttendanceStatus, AttendanceSummary,
    AttendanceSummaryParams, BulkAttendanceDto, MarkAttendanceDto, PaginatedAttendanceResponse,
    UpdateAttendanceDto,
};

use crate::utils::integrity::{
    ensure_class_exists, ensure_user_role, find_class_summary, find_user_summaries,
    find_user_summary, map_unique_violation, order_clause,
};

const ATTENDANCE_COLUMNS: &str =
    "id, date, class_id, student_id, status, remarks, marked_by, created_at, updated_at";

const FILTER_CLAUSE: &str = r#"($1::uuid IS NULL OR class_id = $1)
      AND ($2::uuid IS NULL OR student_id = $2)
      AND ($3::attendance_status IS NULL OR status = $3)
      AND ($4::date IS NULL OR date >= $4)
      AND ($5::date IS NULL OR date <= $5)"#;

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("date", "date"),
    ("status", "status"),
    ("created_at", "created_at"),
];

fn already_marked() -> DomainError {
    DomainError::conflict("Attendance already marked for this student on this date")
}

pub struct AttendanceService;

impl AttendanceService {
    async fn fetch_attendance(db: &PgPool, id: Uuid) -> Result<Attendance, AppError> {
        let record = sqlx::query_as::<_, Attendance>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch attendance")?
        .ok_or(DomainError::NotFound("Attendance record"))?;
        Ok(record)
    }

    #[instrument(skip(db, dto), fields(student.id = %dto.student_id, db.operation = "INSERT", db.table = "attendance"))]
    pub async fn mark_attendance(
        db: &PgPool,
        dto: MarkAttendanceDto,
        marked_by: Uuid,
    ) -> Result<Attendance, AppError> {
        ensure_class_exists(db, dto.class_id).await?;
        ensure_user_role(db, dto.student_id, UserRole::Student).await?;

        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(
                   SELECT 1 FROM attendance
                   WHERE date = $1 AND class_id = $2 AND student_id = $3)"#,
        )
        .bind(dto.date)
        .bind(dto.class_id)
        .bind(dto.student_id)
        .fetch_one(db)
        .await
        .context("Failed to check attendance uniqueness")?;
        if exists {
            return Err(already_marked().into());
        }

        let record = sqlx::query_as::<_, Attendance>(&format!(
            r#"INSERT INTO attendance (date, class_id, student_id, status, remarks, marked_by)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {ATTENDANCE_COLUMNS}"#
        ))
        .bind(dto.date)
        .bind(dto.class_id)
        .bind(dto.student_id)
        .bind(dto.status)
        .bind(&dto.remarks)
        .bind(marked_by)
        .fetch_one(db)
        .await
        .map_err(|e| map_unique_violation(e, already_marked()))?;

        info!(attendance.id = %record.id, "Attendance marked");
        Ok(record)
    }

    /// Marks a class for one day in a single transaction, overwriting any
    /// earlier mark for the same student and date.
    #[instrument(skip(db, dto), fields(class.id = %dto.class_id, records = dto.records.len(), db.operation = "UPSERT", db.table = "attendance"))]
    pub async fn bulk_mark(
        db: &PgPool,
        dto: BulkAttendanceDto,
        marked_by: Uuid,
    ) -> Result<Vec<Attendance>, AppError> {
        ensure_class_exists(db, dto.class_id).await?;

        let mut student_ids: Vec<Uuid> = Vec::with_capacity(dto.records.len());
        for record in &dto.records {
            if student_ids.contains(&record.student_id) {
                return Err(DomainError::rule("Each student may appear only once per bulk request").into());
            }
            student_ids.push(record.student_id);
        }

        let students = find_user_summaries(db, &student_ids).await?;
        for id in &student_ids {
            let student = students
                .iter()
                .find(|s| s.id == *id)
                .ok_or(DomainError::NotFound("Student"))?;
            if student.role != UserRole::Student {
                return Err(DomainError::rule(format!(
                    "Referenced user must have role {}",
                    UserRole::Student
                ))
                .into());
            }
        }

        let mut tx = db.begin().await.context("Failed to begin transaction")?;
        let mut saved = Vec::with_capacity(dto.records.len());

        for record in &dto.records {
            let row = sqlx::query_as::<_, Attendance>(&format!(
                r#"INSERT INTO attendance (date, class_id, student_id, status, remarks, marked_by)
                   VALUES ($1, $2, $3, $4, $5, $6)
                   ON CONFLICT (date, class_id, student_id) DO UPDATE SET
                       status = EXCLUDED.status,
                       remarks = EXCLUDED.remarks,
                       marked_by = EXCLUDED.marked_by,
                       updated_at = NOW()
                   RETURNING {ATTENDANCE_COLUMNS}"#
            ))
            .bind(dto.date)
            .bind(dto.class_id)
            .bind(record.student_id)
            .bind(record.status)
            .bind(&record.remarks)
            .bind(marked_by)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to store attendance")?;
            saved.push(row);
        }

        tx.commit().await.context("Failed to commit transaction")?;

        info!(count = saved.len(), "Bulk attendance stored");
        Ok(saved)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "attendance"))]
    pub async fn list_attendance(
        db: &PgPool,
        filters: AttendanceFilterParams,
    ) -> Result<PaginatedAttendanceResponse, AppError> {
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM attendance WHERE {FILTER_CLAUSE}"
        ))
        .bind(filters.class_id)
        .bind(filters.student_id)
        .bind(filters.status)
        .bind(filters.from)
        .bind(filters.to)
        .fetch_one(db)
        .await
        .context("Failed to count attendance")?;

        let order = order_clause(
            filters.sort_by.as_deref(),
            filters.sort_order,
            SORT_COLUMNS,
            "date",
        );
        let records = sqlx::query_as::<_, Attendance>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE {FILTER_CLAUSE} {order} LIMIT $6 OFFSET $7"
        ))
        .bind(filters.class_id)
        .bind(filters.student_id)
        .bind(filters.status)
        .bind(filters.from)
        .bind(filters.to)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch attendance")?;

        debug!(total, returned = records.len(), "Attendance fetched");

        Ok(PaginatedAttendanceResponse {
            data: records,
            meta: filters.pagination.meta(total),
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "attendance"))]
    pub async fn get_attendance(db: &PgPool, id: Uuid) -> Result<AttendanceDetails, AppError> {
        let attendance = Self::fetch_attendance(db, id).await?;
        let student = find_user_summary(db, attendance.student_id).await?;
        let class = find_class_summary(db, attendance.class_id).await?;
        let marker = find_user_summary(db, attendance.marked_by).await?;

        Ok(AttendanceDetails {
            attendance,
            student,
            class,
            marker,
        })
    }

    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "attendance"))]
    pub async fn update_attendance(
        db: &PgPool,
        id: Uuid,
        dto: UpdateAttendanceDto,
        marked_by: Uuid,
    ) -> Result<Attendance, AppError> {
        let record = sqlx::query_as::<_, Attendance>(&format!(
            r#"UPDATE attendance SET
                   status = COALESCE($2, status),
                   remarks = COALESCE($3, remarks),
                   marked_by = $4,
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {ATTENDANCE_COLUMNS}"#
        ))
        .bind(id)
        .bind(dto.status)
        .bind(&dto.remarks)
        .bind(marked_by)
        .fetch_optional(db)
        .await
        .context("Failed to update attendance")?
        .ok_or(DomainError::NotFound("Attendance record"))?;

        info!(attendance.id = %id, "Attendance updated");
        Ok(record)
    }

    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "attendance"))]
    pub async fn delete_attendance(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM attendance WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete attendance")?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("Attendance record").into());
        }

        info!(attendance.id = %id, "Attendance deleted");
        Ok(())
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "attendance"))]
    pub async fn student_summary(
        db: &PgPool,
        student_id: Uuid,
        params: AttendanceSummaryParams,
    ) -> Result<AttendanceSummary, AppError> {
        ensure_user_role(db, student_id, UserRole::Student).await?;

        let statuses: Vec<AttendanceStatus> = sqlx::query_scalar(
            r#"SELECT status FROM attendance
               WHERE student_id = $1
                 AND ($2::uuid IS NULL OR class_id = $2)
                 AND ($3::date IS NULL OR date >= $3)
                 AND ($4::date IS NULL OR date <= $4)"#,
        )
        .bind(student_id)
        .bind(params.class_id)
        .bind(params.from)
        .bind(params.to)
        .fetch_all(db)
        .await
        .context("Failed to fetch attendance statuses")?;

        Ok(AttendanceSummary::from_statuses(student_id, &statuses))
    }
}
