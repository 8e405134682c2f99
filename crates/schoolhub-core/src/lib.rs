//! # SchoolHub Core
//!
//! Core types, errors, and utilities shared by every SchoolHub crate.
//!
//! - [`errors`]: [`AppError`] with HTTP response conversion and the
//!   [`DomainError`] taxonomy of business-rule failures
//! - [`pagination`]: Pagination and sorting parameters for list endpoints
//! - [`password`]: Password hashing and verification
//! - [`serde`]: Custom serde deserialization helpers for query strings
//!
//! # Example
//!
//! ```ignore
//! use schoolhub_core::errors::{AppError, DomainError};
//! use schoolhub_core::password::{hash_password, verify_password};
//!
//! let hash = hash_password("secure_password")?;
//! if !verify_password("secure_password", &hash)? {
//!     return Err(DomainError::InvalidCredentials.into());
//! }
//! ```

pub mod errors;
pub mod pagination;
pub mod password;
pub mod serde;

// Re-export commonly used types at crate root
pub use errors::{AppError, DomainError};
pub use pagination::{PaginationMeta, PaginationParams, SortOrder};
pub use password::{hash_password, verify_password};
