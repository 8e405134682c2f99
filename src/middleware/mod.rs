//! Authentication and authorization extractors.
//!
//! 1. Client sends `Authorization: Bearer <access token>`
//! 2. [`auth::AuthUser`] verifies the token and exposes its claims
//! 3. Role extractors from [`role`] run the central guard on top of it
//!
//! ```ignore
//! use crate::middleware::role::RequireTeacher;
//!
//! async fn create_exam(RequireTeacher(auth_user): RequireTeacher) -> impl IntoResponse {
//!     // only TEACHER or ADMIN reach this point
//! }
//! ```

pub mod auth;
pub mod role;
