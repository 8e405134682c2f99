//! Password reset tokens.
//!
//! The raw token (256 random bits, hex encoded) only ever leaves the server in
//! the reset email. The database stores its SHA-256 digest.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

pub struct ResetToken {
    /// Sent to the user
    pub token: String,
    /// Persisted
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

pub fn generate() -> ResetToken {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    ResetToken {
        hash: hash(&token),
        token,
        expires_at: Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
    }
}

pub fn hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
