//! JWT (JSON Web Token) utilities for authentication.
//!
//! Access and refresh tokens are signed with different secrets from
//! [`JwtConfig`], so one class of token never verifies as the other. Every
//! verification failure (expired, malformed, bad signature) collapses into a
//! single [`DomainError::TokenInvalid`].
//!
//! # Example
//!
//! ```ignore
//! use schoolhub_auth::{issue_token_pair, verify_refresh_token};
//!
//! let pair = issue_token_pair(user_id, "user@school.test", UserRole::Student, &config)?;
//! let claims = verify_refresh_token(&pair.refresh_token, &config)?;
//! ```

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use schoolhub_config::JwtConfig;
use schoolhub_core::{AppError, DomainError};

use crate::claims::{Claims, RefreshTokenClaims, TokenPair};
use crate::roles::UserRole;

/// Creates a short-lived access token for the given identity.
///
/// # Errors
///
/// Returns an internal error if encoding fails.
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    role: UserRole,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.access_secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

/// Verifies an access token and returns its claims.
///
/// # Errors
///
/// [`DomainError::TokenInvalid`] for any signature, expiry, or format failure.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.access_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| DomainError::TokenInvalid.into())
}

/// Creates a long-lived refresh token signed with the refresh secret.
pub fn create_refresh_token(
    user_id: Uuid,
    email: &str,
    role: UserRole,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.refresh_token_expiry as usize;

    let claims = RefreshTokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.refresh_secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create refresh token: {}", e)))
}

/// Verifies a refresh token. Same failure contract as [`verify_token`].
pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, AppError> {
    decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.refresh_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| DomainError::TokenInvalid.into())
}

/// Issues a fresh access/refresh pair for one identity.
pub fn issue_token_pair(
    user_id: Uuid,
    email: &str,
    role: UserRole,
    jwt_config: &JwtConfig,
) -> Result<TokenPair, AppError> {
    Ok(TokenPair {
        access_token: create_access_token(user_id, email, role, jwt_config)?,
        refresh_token: create_refresh_token(user_id, email, role, jwt_config)?,
    })
}
