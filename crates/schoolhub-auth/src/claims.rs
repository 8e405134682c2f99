//! JWT claim structures for authentication tokens.
//!
//! - [`Claims`]: Access token claims carrying identity and role
//! - [`RefreshTokenClaims`]: Refresh token claims, made unique by a `jti`
//! - [`TokenPair`]: The pair handed to clients after login, register, or refresh

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use schoolhub_core::{AppError, DomainError};

use crate::roles::UserRole;

/// JWT claims for access tokens.
///
/// Everything the access guard needs travels in the token, so authorizing a
/// request does not touch the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    /// Parses the subject back into a user id.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| DomainError::TokenInvalid.into())
    }
}

/// JWT claims for refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
    /// Unique token identifier so that two pairs issued in the same second differ
    pub jti: String,
}

impl RefreshTokenClaims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| DomainError::InvalidRefreshToken.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
