use anyhow::Context;
use sqlx::PgPool;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use schoolhub_auth::UserRole;
use schoolhub_core::{AppError, DomainError};
use schoolhub_models::exams::ExamSummary;
use schoolhub_models::grades::{
    CreateGradeDto, Grade, GradeDetails, GradeFilterParams, PaginatedGradesResponse,
    StudentGradeReport, UpdateGradeDto, ensure_marks_within, letter_grade,
};

use crate::metrics::track_integrity_rejection;
use crate::utils::integrity::{ensure_user_role, find_user_summary, map_unique_violation, order_clause};

const GRADE_COLUMNS: &str =
    "id, exam_id, student_id, marks, grade, remarks, graded_by, created_at, updated_at";

const FILTER_CLAUSE: &str = r#"($1::uuid IS NULL OR exam_id = $1)
      AND ($2::uuid IS NULL OR student_id = $2)"#;

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("marks", "marks"),
    ("grade", "grade"),
    ("created_at", "created_at"),
];

pub struct GradeService;

impl GradeService {
    async fn exam_max_marks(db: &PgPool, exam_id: Uuid) -> Result<f64, AppError> {
        let max_marks: f64 = sqlx::query_scalar("SELECT max_marks FROM exams WHERE id = $1")
            .bind(exam_id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch exam")?
            .ok_or(DomainError::NotFound("Exam"))?;
        Ok(max_marks)
    }

    async fn fetch_grade(db: &PgPool, id: Uuid) -> Result<Grade, AppError> {
        let grade = sqlx::query_as::<_, Grade>(&format!(
            "SELECT {GRADE_COLUMNS} FROM grades WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch grade")?
        .ok_or(DomainError::NotFound("Grade"))?;
        Ok(grade)
    }

    async fn exam_summaries(db: &PgPool, exam_ids: &[Uuid]) -> Result<Vec<ExamSummary>, AppError> {
        let exams = sqlx::query_as::<_, ExamSummary>(
            "SELECT id, title, max_marks, exam_type FROM exams WHERE id = ANY($1)",
        )
        .bind(exam_ids)
        .fetch_all(db)
        .await
        .context("Failed to fetch exam summaries")?;
        Ok(exams)
    }

    #[instrument(skip(db, dto), fields(exam.id = %dto.exam_id, student.id = %dto.student_id, db.operation = "INSERT", db.table = "grades"))]
    pub async fn create_grade(
        db: &PgPool,
        dto: CreateGradeDto,
        graded_by: Uuid,
    ) -> Result<Grade, AppError> {
        let max_marks = Self::exam_max_marks(db, dto.exam_id).await?;
        ensure_user_role(db, dto.student_id, UserRole::Student).await?;
        ensure_marks_within(dto.marks, max_marks)
            .inspect_err(|_| track_integrity_rejection("grade"))?;

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM grades WHERE exam_id = $1 AND student_id = $2)",
        )
        .bind(dto.exam_id)
        .bind(dto.student_id)
        .fetch_one(db)
        .await
        .context("Failed to check grade uniqueness")?;
        if exists {
            return Err(DomainError::DuplicateGrade.into());
        }

        let grade = sqlx::query_as::<_, Grade>(&format!(
            r#"INSERT INTO grades (exam_id, student_id, marks, grade, remarks, graded_by)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {GRADE_COLUMNS}"#
        ))
        .bind(dto.exam_id)
        .bind(dto.student_id)
        .bind(dto.marks)
        .bind(letter_grade(dto.marks, max_marks))
        .bind(&dto.remarks)
        .bind(graded_by)
        .fetch_one(db)
        .await
        .map_err(|e| map_unique_violation(e, DomainError::DuplicateGrade))?;

        info!(grade.id = %grade.id, grade.letter = %grade.grade, "Grade recorded");
        Ok(grade)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "grades"))]
    pub async fn list_grades(
        db: &PgPool,
        filters: GradeFilterParams,
    ) -> Result<PaginatedGradesResponse, AppError> {
        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM grades WHERE {FILTER_CLAUSE}"))
                .bind(filters.exam_id)
                .bind(filters.student_id)
                .fetch_one(db)
                .await
                .context("Failed to count grades")?;

        let order = order_clause(
            filters.sort_by.as_deref(),
            filters.sort_order,
            SORT_COLUMNS,
            "created_at",
        );
        let grades = sqlx::query_as::<_, Grade>(&format!(
            "SELECT {GRADE_COLUMNS} FROM grades WHERE {FILTER_CLAUSE} {order} LIMIT $3 OFFSET $4"
        ))
        .bind(filters.exam_id)
        .bind(filters.student_id)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch grades")?;

        debug!(total, returned = grades.len(), "Grades fetched");

        Ok(PaginatedGradesResponse {
            data: grades,
            meta: filters.pagination.meta(total),
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "grades"))]
    pub async fn get_grade(db: &PgPool, id: Uuid) -> Result<GradeDetails, AppError> {
        let grade = Self::fetch_grade(db, id).await?;
        let exam = Self::exam_summaries(db, &[grade.exam_id]).await?.into_iter().next();
        let student = find_user_summary(db, grade.student_id).await?;

        Ok(GradeDetails {
            grade,
            exam,
            student,
        })
    }

    /// Changing the marks re-derives the letter grade.
    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "grades"))]
    pub async fn update_grade(
        db: &PgPool,
        id: Uuid,
        dto: UpdateGradeDto,
        graded_by: Uuid,
    ) -> Result<Grade, AppError> {
        let current = Self::fetch_grade(db, id).await?;

        let (marks, letter) = match dto.marks {
            Some(marks) => {
                let max_marks = Self::exam_max_marks(db, current.exam_id).await?;
                ensure_marks_within(marks, max_marks)
                    .inspect_err(|_| track_integrity_rejection("grade"))?;
                (marks, letter_grade(marks, max_marks).to_string())
            }
            None => (current.marks, current.grade),
        };

        let grade = sqlx::query_as::<_, Grade>(&format!(
            r#"UPDATE grades SET
                   marks = $2,
                   grade = $3,
                   remarks = COALESCE($4, remarks),
                   graded_by = $5,
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {GRADE_COLUMNS}"#
        ))
        .bind(id)
        .bind(marks)
        .bind(&letter)
        .bind(&dto.remarks)
        .bind(graded_by)
        .fetch_one(db)
        .await
        .context("Failed to update grade")?;

        info!(grade.id = %id, grade.letter = %grade.grade, "Grade updated");
        Ok(grade)
    }

    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "grades"))]
    pub async fn delete_grade(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM grades WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete grade")?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("Grade").into());
        }

        info!(grade.id = %id, "Grade deleted");
        Ok(())
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "grades"))]
    pub async fn student_report(
        db: &PgPool,
        student_id: Uuid,
    ) -> Result<StudentGradeReport, AppError> {
        let student = ensure_user_role(db, student_id, UserRole::Student).await?;

        let grades = sqlx::query_as::<_, Grade>(&format!(
            "SELECT {GRADE_COLUMNS} FROM grades WHERE student_id = $1 ORDER BY created_at"
        ))
        .bind(student_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch student grades")?;

        let exam_ids: Vec<Uuid> = grades.iter().map(|g| g.exam_id).collect();
        let exams = Self::exam_summaries(db, &exam_ids).await?;

        let details = grades
            .into_iter()
            .map(|grade| GradeDetails {
                exam: exams.iter().find(|e| e.id == grade.exam_id).cloned(),
                student: Some(student.clone()),
                grade,
            })
            .collect();

        Ok(StudentGradeReport::new(student, details))
    }
}
