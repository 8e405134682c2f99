//! Lookups shared by the relational-integrity checks of every entity service.
//!
//! Each helper either passes silently or fails with the specific domain error
//! that aborts the enclosing write.

use sqlx::PgPool;
use uuid::Uuid;

use schoolhub_auth::UserRole;
use schoolhub_core::{AppError, DomainError};
use schoolhub_models::classes::ClassSummary;
use schoolhub_models::subjects::SubjectSummary;
use schoolhub_models::users::UserSummary;

fn role_label(role: UserRole) -> &'static str {
    match role {
        UserRole::Admin => "Admin",
        UserRole::Teacher => "Teacher",
        UserRole::Student => "Student",
        UserRole::Parent => "Parent",
    }
}

/// Loads a user and requires it to hold `role`.
///
/// Missing users are reported as `"<Role> not found"`; users with another role
/// break a business rule.
pub async fn ensure_user_role(
    db: &PgPool,
    user_id: Uuid,
    role: UserRole,
) -> Result<UserSummary, AppError> {
    let user = find_user_summary(db, user_id)
        .await?
        .ok_or(DomainError::NotFound(role_label(role)))?;

    if user.role != role {
        return Err(DomainError::rule(format!(
            "Referenced user must have role {}",
            role
        ))
        .into());
    }

    Ok(user)
}

pub async fn find_user_summary(db: &PgPool, user_id: Uuid) -> Result<Option<UserSummary>, AppError> {
    let user = sqlx::query_as::<_, UserSummary>(
        "SELECT id, first_name, last_name, email, role FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

/// Resolves a set of user ids, silently skipping ids that no longer exist.
pub async fn find_user_summaries(db: &PgPool, ids: &[Uuid]) -> Result<Vec<UserSummary>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let users = sqlx::query_as::<_, UserSummary>(
        r#"SELECT id, first_name, last_name, email, role
           FROM users WHERE id = ANY($1)
           ORDER BY last_name, first_name"#,
    )
    .bind(ids)
    .fetch_all(db)
    .await?;
    Ok(users)
}

pub async fn ensure_class_exists(db: &PgPool, class_id: Uuid) -> Result<ClassSummary, AppError> {
    find_class_summary(db, class_id)
        .await?
        .ok_or_else(|| DomainError::NotFound("Class").into())
}

pub async fn find_class_summary(
    db: &PgPool,
    class_id: Uuid,
) -> Result<Option<ClassSummary>, AppError> {
    let class = sqlx::query_as::<_, ClassSummary>(
        "SELECT id, name, section, academic_year FROM classes WHERE id = $1",
    )
    .bind(class_id)
    .fetch_optional(db)
    .await?;
    Ok(class)
}

/// Subject ids currently assigned to a class.
pub async fn class_subject_ids(db: &PgPool, class_id: Uuid) -> Result<Vec<Uuid>, AppError> {
    let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM subjects WHERE class_id = $1")
        .bind(class_id)
        .fetch_all(db)
        .await?;
    Ok(ids)
}

pub async fn find_subject_summaries(
    db: &PgPool,
    ids: &[Uuid],
) -> Result<Vec<SubjectSummary>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let subjects = sqlx::query_as::<_, SubjectSummary>(
        "SELECT id, name, code FROM subjects WHERE id = ANY($1) ORDER BY name",
    )
    .bind(ids)
    .fetch_all(db)
    .await?;
    Ok(subjects)
}

/// Every id must exist in `table`. Only called with fixed table names.
pub async fn ensure_all_exist(
    db: &PgPool,
    table: &'static str,
    ids: &[Uuid],
    entity: &'static str,
) -> Result<(), AppError> {
    let found: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(DISTINCT id) FROM {} WHERE id = ANY($1)",
        table
    ))
    .bind(ids)
    .fetch_one(db)
    .await?;

    if found != ids.len() as i64 {
        return Err(DomainError::NotFound(entity).into());
    }
    Ok(())
}

/// Translates a unique-index violation into `on_conflict`; anything else
/// stays an internal error.
pub fn map_unique_violation(err: sqlx::Error, on_conflict: DomainError) -> AppError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_unique_violation()
    {
        return on_conflict.into();
    }
    AppError::database(err)
}

/// Whitelisted `ORDER BY` clause for list queries.
pub fn order_clause(
    sort_by: Option<&str>,
    sort_order: Option<schoolhub_core::SortOrder>,
    allowed: &[(&str, &'static str)],
    default_column: &'static str,
) -> String {
    let column = sort_by
        .and_then(|key| allowed.iter().find(|(name, _)| *name == key))
        .map(|(_, column)| *column)
        .unwrap_or(default_column);
    format!(
        "ORDER BY {} {}",
        column,
        sort_order.unwrap_or_default().as_sql()
    )
}

/// `%term%` for `ILIKE`, or `None` when the search box is empty.
pub fn like_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.replace('%', "\\%").replace('_', "\\_")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolhub_core::SortOrder;

    const COLUMNS: &[(&str, &str)] = &[("name", "c.name"), ("created_at", "c.created_at")];

    #[test]
    fn test_order_clause_whitelist() {
        assert_eq!(
            order_clause(Some("name"), Some(SortOrder::Asc), COLUMNS, "c.created_at"),
            "ORDER BY c.name ASC"
        );
        assert_eq!(
            order_clause(Some("password_hash; DROP TABLE"), None, COLUMNS, "c.created_at"),
            "ORDER BY c.created_at DESC"
        );
    }

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern(Some(" ada ")), Some("%ada%".to_string()));
        assert_eq!(like_pattern(Some("   ")), None);
        assert_eq!(like_pattern(None), None);
        assert_eq!(like_pattern(Some("50%")), Some("%50\\%%".to_string()));
    }

    #[test]
    fn test_non_unique_errors_stay_internal() {
        let err = map_unique_violation(sqlx::Error::RowNotFound, DomainError::DuplicateGrade);
        assert_eq!(err.status.as_u16(), 500);
        assert!(err.domain().is_none());
    }
}
