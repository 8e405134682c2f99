use schoolhub_config::{CorsConfig, EmailConfig, JwtConfig};
use schoolhub_db::PgPool;

use crate::utils::email::Mailer;

/// Shared state handed to every handler. Built once at startup.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub mailer: Mailer,
    pub cors_config: CorsConfig,
}

impl AppState {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            jwt_config: JwtConfig::from_env(),
            mailer: Mailer::new(EmailConfig::from_env()),
            cors_config: CorsConfig::from_env(),
        }
    }
}
