//! Role extractors built on the central guard in `schoolhub_auth::guard`.

use schoolhub_auth::{UserRole, authorize};
use schoolhub_core::AppError;

use crate::middleware::auth::AuthUser;

/// Declares an extractor that authenticates the caller and then requires one
/// of `$roles` (ADMIN always passes).
#[macro_export]
macro_rules! require_role {
    ($name:ident, $roles:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = schoolhub_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user = <$crate::middleware::auth::AuthUser as axum::extract::FromRequestParts<
                    $crate::state::AppState,
                >>::from_request_parts(parts, state)
                .await?;
                $crate::middleware::role::check_roles(&auth_user, $roles)?;
                Ok($name(auth_user))
            }
        }
    };
}

require_role!(RequireTeacher, schoolhub_auth::REQUIRE_TEACHER);
require_role!(RequireAdmin, schoolhub_auth::REQUIRE_ADMIN);

/// Runs the guard for an already-authenticated user and records denials.
pub fn check_roles(auth_user: &AuthUser, allowed: &[UserRole]) -> Result<(), AppError> {
    authorize(auth_user.role(), allowed).inspect_err(|_| {
        tracing::warn!(
            user = %auth_user.0.sub,
            role = %auth_user.role(),
            "Access denied by role guard"
        );
    })
}

/// Resource-level rule: only the owner of a record or an ADMIN may change it.
pub fn check_owner_or_admin(
    auth_user: &AuthUser,
    owner_id: uuid::Uuid,
    message: &str,
) -> Result<(), AppError> {
    if auth_user.is_admin() || auth_user.user_id()? == owner_id {
        return Ok(());
    }
    Err(schoolhub_core::DomainError::forbidden(message).into())
}
