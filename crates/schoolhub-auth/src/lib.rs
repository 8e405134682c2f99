//! # SchoolHub Auth
//!
//! Authentication primitives for the SchoolHub API:
//!
//! - [`roles`]: The [`UserRole`] enum shared by tokens, storage, and the guard
//! - [`claims`]: JWT claim structures for access and refresh tokens
//! - [`jwt`]: Token pair issuance and verification
//! - [`guard`]: The single role-capability check behind every restricted route
//!
//! # Token Types
//!
//! - **Access Token** ([`Claims`]): ~15 minutes, signed with the access secret
//! - **Refresh Token** ([`RefreshTokenClaims`]): ~7 days, signed with the refresh secret
//!
//! Both carry the user id (`sub`), email, and role. Tokens are stateless; there
//! is no server-side revocation list.
//!
//! # Example
//!
//! ```ignore
//! use schoolhub_auth::{UserRole, issue_token_pair, verify_token};
//! use schoolhub_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let pair = issue_token_pair(user_id, "teacher@school.test", UserRole::Teacher, &config)?;
//! let claims = verify_token(&pair.access_token, &config)?;
//! assert_eq!(claims.role, UserRole::Teacher);
//! ```

pub mod claims;
pub mod guard;
pub mod jwt;
pub mod roles;

pub use claims::{Claims, RefreshTokenClaims, TokenPair};
pub use guard::{REQUIRE_ADMIN, REQUIRE_TEACHER, authorize, is_allowed};
pub use jwt::{
    create_access_token, create_refresh_token, issue_token_pair, verify_refresh_token,
    verify_token,
};
pub use roles::UserRole;
