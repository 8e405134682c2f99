use anyhow::Context;
use sqlx::PgPool;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use schoolhub_auth::UserRole;
use schoolhub_core::{AppError, DomainError, hash_password};
use schoolhub_models::users::{
    CreateUserDto, PaginatedUsersResponse, USER_COLUMNS, UpdateProfileDto, UpdateUserDto, User,
    UserFilterParams, normalize_email,
};

use crate::utils::integrity::{ensure_user_role, like_pattern, map_unique_violation, order_clause};

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("email", "email"),
    ("first_name", "first_name"),
    ("last_name", "last_name"),
    ("role", "role"),
    ("created_at", "created_at"),
    ("last_login", "last_login"),
];

const FILTER_CLAUSE: &str = r#"($1::user_role IS NULL OR role = $1)
      AND ($2::user_status IS NULL OR status = $2)
      AND ($3::uuid IS NULL OR class_id = $3)
      AND ($4::text IS NULL OR first_name ILIKE $4 OR last_name ILIKE $4 OR email ILIKE $4)"#;

pub struct UserService;

impl UserService {
    #[instrument(skip(db, dto), fields(email = %dto.email, role = %dto.role, db.operation = "INSERT", db.table = "users"))]
    pub async fn create_user(db: &PgPool, dto: CreateUserDto) -> Result<User, AppError> {
        let email = normalize_email(&dto.email);

        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = $1)")
                .bind(&email)
                .fetch_one(db)
                .await
                .context("Failed to check email uniqueness")?;
        if taken {
            return Err(DomainError::DuplicateEmail.into());
        }

        if let Some(parent_id) = dto.parent_id {
            ensure_user_role(db, parent_id, UserRole::Parent).await?;
        }

        let password_hash = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users
                   (email, password_hash, first_name, last_name, role, status, parent_id,
                    phone, date_of_birth, address)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(&email)
        .bind(&password_hash)
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .bind(dto.role)
        .bind(dto.status.unwrap_or_default())
        .bind(dto.parent_id)
        .bind(&dto.phone)
        .bind(dto.date_of_birth)
        .bind(&dto.address)
        .fetch_one(db)
        .await
        .map_err(|e| map_unique_violation(e, DomainError::DuplicateEmail))?;

        info!(user.id = %user.id, "User created");
        Ok(user)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn list_users(
        db: &PgPool,
        filters: UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let search = like_pattern(filters.search.as_deref());

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {FILTER_CLAUSE}"))
                .bind(filters.role)
                .bind(filters.status)
                .bind(filters.class_id)
                .bind(&search)
                .fetch_one(db)
                .await
                .context("Failed to count users")?;

        let order = order_clause(
            filters.sort_by.as_deref(),
            filters.sort_order,
            SORT_COLUMNS,
            "created_at",
        );
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {FILTER_CLAUSE} {order} LIMIT $5 OFFSET $6"
        ))
        .bind(filters.role)
        .bind(filters.status)
        .bind(filters.class_id)
        .bind(&search)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch users")?;

        debug!(total, returned = users.len(), "Users fetched");

        Ok(PaginatedUsersResponse {
            data: users,
            meta: filters.pagination.meta(total),
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn get_user(db: &PgPool, id: Uuid) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch user by ID")?
        .ok_or(DomainError::NotFound("User"))?;

        Ok(user)
    }

    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "users"))]
    pub async fn update_user(db: &PgPool, id: Uuid, dto: UpdateUserDto) -> Result<User, AppError> {
        let email = dto.email.as_deref().map(normalize_email);

        if let Some(email) = &email {
            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = $1 AND id <> $2)",
            )
            .bind(email)
            .bind(id)
            .fetch_one(db)
            .await
            .context("Failed to check email uniqueness")?;
            if taken {
                return Err(DomainError::DuplicateEmail.into());
            }
        }

        if let Some(parent_id) = dto.parent_id {
            if parent_id == id {
                return Err(DomainError::rule("A user cannot be their own parent").into());
            }
            ensure_user_role(db, parent_id, UserRole::Parent).await?;
        }

        let user = sqlx::query_as::<_, User>(&format!(
            r#"UPDATE users SET
                   email = COALESCE($2, email),
                   first_name = COALESCE($3, first_name),
                   last_name = COALESCE($4, last_name),
                   status = COALESCE($5, status),
                   parent_id = COALESCE($6, parent_id),
                   phone = COALESCE($7, phone),
                   date_of_birth = COALESCE($8, date_of_birth),
                   address = COALESCE($9, address),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(id)
        .bind(email)
        .bind(dto.first_name.as_deref().map(str::trim))
        .bind(dto.last_name.as_deref().map(str::trim))
        .bind(dto.status)
        .bind(dto.parent_id)
        .bind(&dto.phone)
        .bind(dto.date_of_birth)
        .bind(&dto.address)
        .fetch_optional(db)
        .await
        .map_err(|e| map_unique_violation(e, DomainError::DuplicateEmail))?
        .ok_or(DomainError::NotFound("User"))?;

        info!(user.id = %user.id, "User updated");
        Ok(user)
    }

    /// Self-service edit of personal details.
    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "users"))]
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        dto: UpdateProfileDto,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"UPDATE users SET
                   first_name = COALESCE($2, first_name),
                   last_name = COALESCE($3, last_name),
                   phone = COALESCE($4, phone),
                   date_of_birth = COALESCE($5, date_of_birth),
                   address = COALESCE($6, address),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(id)
        .bind(dto.first_name.as_deref().map(str::trim))
        .bind(dto.last_name.as_deref().map(str::trim))
        .bind(&dto.phone)
        .bind(dto.date_of_birth)
        .bind(&dto.address)
        .fetch_optional(db)
        .await
        .context("Failed to update profile")?
        .ok_or(DomainError::NotFound("User"))?;

        Ok(user)
    }

    /// References held by other records are left in place.
    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "users"))]
    pub async fn delete_user(db: &PgPool, id: Uuid, acting_user_id: Uuid) -> Result<(), AppError> {
        if id == acting_user_id {
            return Err(DomainError::rule("You cannot delete your own account").into());
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete user")?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("User").into());
        }

        info!(user.id = %id, "User deleted");
        Ok(())
    }
}
