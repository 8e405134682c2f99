//! Role-based access control.
//!
//! There is exactly one capability check, [`is_allowed`]. Route-level policies
//! are declared as role sets and `ADMIN` passes every one of them.

use schoolhub_core::{AppError, DomainError};

use crate::roles::UserRole;

pub const REQUIRE_TEACHER: &[UserRole] = &[UserRole::Teacher, UserRole::Admin];
pub const REQUIRE_ADMIN: &[UserRole] = &[UserRole::Admin];

pub fn is_allowed(role: UserRole, allowed: &[UserRole]) -> bool {
    role == UserRole::Admin || allowed.contains(&role)
}

/// Returns `Forbidden` when `role` is outside `allowed`.
pub fn authorize(role: UserRole, allowed: &[UserRole]) -> Result<(), AppError> {
    if is_allowed(role, allowed) {
        return Ok(());
    }

    let required = allowed
        .iter()
        .map(UserRole::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    Err(DomainError::forbidden(format!(
        "Access denied. Required role: {}",
        required
    ))
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_passes_every_policy() {
        assert!(is_allowed(UserRole::Admin, REQUIRE_ADMIN));
        assert!(is_allowed(UserRole::Admin, REQUIRE_TEACHER));
        assert!(is_allowed(UserRole::Admin, &[UserRole::Parent]));
        assert!(is_allowed(UserRole::Admin, &[]));
    }

    #[test]
    fn test_teacher_policy() {
        assert!(is_allowed(UserRole::Teacher, REQUIRE_TEACHER));
        assert!(!is_allowed(UserRole::Student, REQUIRE_TEACHER));
        assert!(!is_allowed(UserRole::Parent, REQUIRE_TEACHER));
    }

    #[test]
    fn test_admin_policy_rejects_teacher() {
        let err = authorize(UserRole::Teacher, REQUIRE_ADMIN).unwrap_err();
        assert_eq!(err.status.as_u16(), 403);
        assert!(err.error.to_string().contains("ADMIN"));
    }

    #[test]
    fn test_authorize_ok() {
        assert!(authorize(UserRole::Student, &[UserRole::Student]).is_ok());
    }
}
