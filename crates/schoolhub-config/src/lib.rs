//! # SchoolHub Config
//!
//! Configuration structures loaded from environment variables. Each type has a
//! `from_env()` constructor that falls back to development defaults.
//!
//! - [`jwt`]: Access/refresh token secrets and lifetimes
//! - [`cors`]: Allowed CORS origins
//! - [`email`]: SMTP settings and the frontend URL used in reset links
//! - [`server`]: Bind address
//!
//! # Example
//!
//! ```ignore
//! use schoolhub_config::{CorsConfig, EmailConfig, JwtConfig, ServerConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let server = ServerConfig::from_env();
//! println!("listening on {}", server.address());
//! ```

pub mod cors;
pub mod email;
pub mod jwt;
pub mod server;

pub use cors::CorsConfig;
pub use email::EmailConfig;
pub use jwt::JwtConfig;
pub use server::ServerConfig;

/// Reads `key` and parses it, falling back to `default` when unset or invalid.
pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
