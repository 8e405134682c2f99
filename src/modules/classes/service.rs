use anyhow::Context;
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use schoolhub_auth::UserRole;
use schoolhub_core::{AppError, DomainError};
use schoolhub_models::classes::{
    Class, ClassDetails, ClassFilterParams, CreateClassDto, DEFAULT_CAPACITY,
    PaginatedClassesResponse, UpdateClassDto, ensure_capacity, ensure_capacity_not_below,
    ensure_deletable,
};
use schoolhub_models::subjects::SubjectSummary;
use schoolhub_models::users::UserSummary;

use crate::metrics::track_integrity_rejection;
use crate::utils::integrity::{
    ensure_user_role, find_user_summary, like_pattern, map_unique_violation, order_clause,
};

const CLASS_SELECT: &str = r#"SELECT c.id, c.name, c.section, c.academic_year, c.teacher_id,
       c.capacity, c.room, c.description,
       (SELECT COUNT(*) FROM class_students cs WHERE cs.class_id = c.id) AS student_count,
       c.created_at, c.updated_at
FROM classes c"#;

const FILTER_CLAUSE: &str = r#"($1::int IS NULL OR c.academic_year = $1)
      AND ($2::uuid IS NULL OR c.teacher_id = $2)
      AND ($3::text IS NULL OR c.name ILIKE $3 OR c.section ILIKE $3 OR c.room ILIKE $3)"#;

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("name", "c.name"),
    ("section", "c.section"),
    ("academic_year", "c.academic_year"),
    ("capacity", "c.capacity"),
    ("created_at", "c.created_at"),
];

const IN_ANOTHER_CLASS: &str = "Student already belongs to another class";

fn duplicate_class() -> DomainError {
    DomainError::conflict("A class with this name, section and academic year already exists")
}

pub struct ClassService;

impl ClassService {
    async fn fetch_class(db: &PgPool, id: Uuid) -> Result<Class, AppError> {
        let class = sqlx::query_as::<_, Class>(&format!("{CLASS_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch class")?
            .ok_or(DomainError::NotFound("Class"))?;
        Ok(class)
    }

    async fn ensure_unique(
        db: &PgPool,
        name: &str,
        section: &str,
        academic_year: i32,
        exclude_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(
                   SELECT 1 FROM classes
                   WHERE name = $1 AND section = $2 AND academic_year = $3
                     AND ($4::uuid IS NULL OR id <> $4))"#,
        )
        .bind(name)
        .bind(section)
        .bind(academic_year)
        .bind(exclude_id)
        .fetch_one(db)
        .await
        .context("Failed to check class uniqueness")?;

        if exists {
            return Err(duplicate_class().into());
        }
        Ok(())
    }

    #[instrument(skip(db, dto), fields(class.name = %dto.name, db.operation = "INSERT", db.table = "classes"))]
    pub async fn create_class(db: &PgPool, dto: CreateClassDto) -> Result<Class, AppError> {
        ensure_user_role(db, dto.teacher_id, UserRole::Teacher).await?;

        let name = dto.name.trim();
        let section = dto.section.trim();
        Self::ensure_unique(db, name, section, dto.academic_year, None).await?;

        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO classes (name, section, academic_year, teacher_id, capacity, room, description)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id"#,
        )
        .bind(name)
        .bind(section)
        .bind(dto.academic_year)
        .bind(dto.teacher_id)
        .bind(dto.capacity.unwrap_or(DEFAULT_CAPACITY))
        .bind(&dto.room)
        .bind(&dto.description)
        .fetch_one(db)
        .await
        .map_err(|e| map_unique_violation(e, duplicate_class()))?;

        info!(class.id = %id, "Class created");
        Self::fetch_class(db, id).await
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "classes"))]
    pub async fn list_classes(
        db: &PgPool,
        filters: ClassFilterParams,
    ) -> Result<PaginatedClassesResponse, AppError> {
        let search = like_pattern(filters.search.as_deref());

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM classes c WHERE {FILTER_CLAUSE}"
        ))
        .bind(filters.academic_year)
        .bind(filters.teacher_id)
        .bind(&search)
        .fetch_one(db)
        .await
        .context("Failed to count classes")?;

        let order = order_clause(
            filters.sort_by.as_deref(),
            filters.sort_order,
            SORT_COLUMNS,
            "c.created_at",
        );
        let classes = sqlx::query_as::<_, Class>(&format!(
            "{CLASS_SELECT} WHERE {FILTER_CLAUSE} {order} LIMIT $4 OFFSET $5"
        ))
        .bind(filters.academic_year)
        .bind(filters.teacher_id)
        .bind(&search)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch classes")?;

        debug!(total, returned = classes.len(), "Classes fetched");

        Ok(PaginatedClassesResponse {
            data: classes,
            meta: filters.pagination.meta(total),
        })
    }

    /// Loads a class with its teacher, students, and subjects resolved.
    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "classes"))]
    pub async fn get_class(db: &PgPool, id: Uuid) -> Result<ClassDetails, AppError> {
        let class = Self::fetch_class(db, id).await?;
        let teacher = find_user_summary(db, class.teacher_id).await?;

        let students = sqlx::query_as::<_, UserSummary>(
            r#"SELECT u.id, u.first_name, u.last_name, u.email, u.role
               FROM class_students cs
               JOIN users u ON u.id = cs.student_id
               WHERE cs.class_id = $1
               ORDER BY u.last_name, u.first_name"#,
        )
        .bind(id)
        .fetch_all(db)
        .await
        .context("Failed to fetch class students")?;

        let subjects = sqlx::query_as::<_, SubjectSummary>(
            "SELECT id, name, code FROM subjects WHERE class_id = $1 ORDER BY name",
        )
        .bind(id)
        .fetch_all(db)
        .await
        .context("Failed to fetch class subjects")?;

        Ok(ClassDetails {
            class,
            teacher,
            students,
            subjects,
        })
    }

    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "classes"))]
    pub async fn update_class(db: &PgPool, id: Uuid, dto: UpdateClassDto) -> Result<Class, AppError> {
        let current = Self::fetch_class(db, id).await?;

        if let Some(teacher_id) = dto.teacher_id
            && teacher_id != current.teacher_id
        {
            ensure_user_role(db, teacher_id, UserRole::Teacher).await?;
        }

        if let Some(capacity) = dto.capacity {
            ensure_capacity_not_below(current.student_count, capacity)
                .inspect_err(|_| track_integrity_rejection("class"))?;
        }

        let name = dto.name.as_deref().map(str::trim).unwrap_or(&current.name);
        let section = dto.section.as_deref().map(str::trim).unwrap_or(&current.section);
        let academic_year = dto.academic_year.unwrap_or(current.academic_year);
        Self::ensure_unique(db, name, section, academic_year, Some(id)).await?;

        sqlx::query(
            r#"UPDATE classes SET
                   name = $2, section = $3, academic_year = $4,
                   teacher_id = COALESCE($5, teacher_id),
                   capacity = COALESCE($6, capacity),
                   room = COALESCE($7, room),
                   description = COALESCE($8, description),
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(name)
        .bind(section)
        .bind(academic_year)
        .bind(dto.teacher_id)
        .bind(dto.capacity)
        .bind(&dto.room)
        .bind(&dto.description)
        .execute(db)
        .await
        .map_err(|e| map_unique_violation(e, duplicate_class()))?;

        info!(class.id = %id, "Class updated");
        Self::fetch_class(db, id).await
    }

    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "classes"))]
    pub async fn delete_class(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let class = Self::fetch_class(db, id).await?;
        ensure_deletable(class.student_count).inspect_err(|_| track_integrity_rejection("class"))?;

        sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete class")?;

        info!(class.id = %id, "Class deleted");
        Ok(())
    }

    /// Adds a student to the class roster and points the student's
    /// `class_id` at it.
    #[instrument(skip(db), fields(db.operation = "INSERT", db.table = "class_students"))]
    pub async fn add_student(
        db: &PgPool,
        class_id: Uuid,
        student_id: Uuid,
    ) -> Result<ClassDetails, AppError> {
        Self::fetch_class(db, class_id).await?;
        ensure_user_role(db, student_id, UserRole::Student).await?;

        let mut tx = db.begin().await.context("Failed to begin transaction")?;

        // Serializes concurrent additions to the same class.
        let capacity: i32 =
            sqlx::query_scalar("SELECT capacity FROM classes WHERE id = $1 FOR UPDATE")
                .bind(class_id)
                .fetch_one(&mut *tx)
                .await
                .context("Failed to lock class")?;

        let already_member: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM class_students WHERE class_id = $1 AND student_id = $2)",
        )
        .bind(class_id)
        .bind(student_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to check class membership")?;
        if already_member {
            return Err(DomainError::AlreadyEnrolled.into());
        }

        let other_class: Option<Uuid> = sqlx::query_scalar(
            "SELECT class_id FROM class_students WHERE student_id = $1 AND class_id <> $2",
        )
        .bind(student_id)
        .bind(class_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to check other class membership")?;
        if let Some(other_class) = other_class {
            warn!(class.id = %class_id, other_class.id = %other_class, "Student belongs to another class");
            track_integrity_rejection("class");
            return Err(DomainError::rule(IN_ANOTHER_CLASS).into());
        }

        let member_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM class_students WHERE class_id = $1")
                .bind(class_id)
                .fetch_one(&mut *tx)
                .await
                .context("Failed to count class members")?;
        ensure_capacity(member_count, capacity).inspect_err(|_| {
            warn!(class.id = %class_id, capacity, "Class is full");
            track_integrity_rejection("class");
        })?;

        sqlx::query("INSERT INTO class_students (class_id, student_id) VALUES ($1, $2)")
            .bind(class_id)
            .bind(student_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, DomainError::rule(IN_ANOTHER_CLASS)))?;

        sqlx::query("UPDATE users SET class_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(class_id)
            .bind(student_id)
            .execute(&mut *tx)
            .await
            .context("Failed to update student class")?;

        tx.commit().await.context("Failed to commit transaction")?;

        info!(class.id = %class_id, student.id = %student_id, "Student added to class");
        Self::get_class(db, class_id).await
    }

    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "class_students"))]
    pub async fn remove_student(
        db: &PgPool,
        class_id: Uuid,
        student_id: Uuid,
    ) -> Result<ClassDetails, AppError> {
        Self::fetch_class(db, class_id).await?;

        let mut tx = db.begin().await.context("Failed to begin transaction")?;

        let removed = sqlx::query("DELETE FROM class_students WHERE class_id = $1 AND student_id = $2")
            .bind(class_id)
            .bind(student_id)
            .execute(&mut *tx)
            .await
            .context("Failed to remove class member")?;
        if removed.rows_affected() == 0 {
            return Err(DomainError::rule("Student is not a member of this class").into());
        }

        sqlx::query(
            "UPDATE users SET class_id = NULL, updated_at = NOW() WHERE id = $1 AND class_id = $2",
        )
        .bind(student_id)
        .bind(class_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear student class")?;

        tx.commit().await.context("Failed to commit transaction")?;

        info!(class.id = %class_id, student.id = %student_id, "Student removed from class");
        Self::get_class(db, class_id).await
    }
}
