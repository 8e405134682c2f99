use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use schoolhub_auth::{TokenPair, UserRole, issue_token_pair, verify_refresh_token};
use schoolhub_config::JwtConfig;
use schoolhub_core::{AppError, DomainError, hash_password, verify_password};
use schoolhub_models::auth::{AuthResponse, LoginRequest, RegisterRequest, ResetPasswordRequest};
use schoolhub_models::users::{
    ChangePasswordDto, USER_COLUMNS, UpdateProfileDto, User, UserStatus, normalize_email,
};

use crate::metrics::{
    track_login_failure, track_login_success, track_password_reset, track_tokens_issued,
    track_user_registered,
};
use crate::modules::users::service::UserService;
use crate::utils::email::{Mailer, password_changed_template, password_reset_template};
use crate::utils::integrity::map_unique_violation;
use crate::utils::reset_token;

#[derive(sqlx::FromRow)]
struct UserCredentials {
    id: Uuid,
    password_hash: String,
    status: UserStatus,
}

#[derive(sqlx::FromRow)]
struct TokenIdentity {
    id: Uuid,
    email: String,
    role: UserRole,
    status: UserStatus,
}

pub struct AuthService;

impl AuthService {
    fn issue(user_id: Uuid, email: &str, role: UserRole, jwt: &JwtConfig) -> Result<TokenPair, AppError> {
        let pair = issue_token_pair(user_id, email, role, jwt)?;
        track_tokens_issued();
        Ok(pair)
    }

    #[instrument(skip(db, dto, jwt_config), fields(email = %dto.email, role = %dto.role))]
    pub async fn register(
        db: &PgPool,
        dto: RegisterRequest,
        jwt_config: &JwtConfig,
    ) -> Result<AuthResponse, AppError> {
        let email = normalize_email(&dto.email);

        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = $1)")
                .bind(&email)
                .fetch_one(db)
                .await?;
        if taken {
            return Err(DomainError::DuplicateEmail.into());
        }

        let password_hash = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (email, password_hash, first_name, last_name, role, status, last_login)
               VALUES ($1, $2, $3, $4, $5, 'ACTIVE', NOW())
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(&email)
        .bind(&password_hash)
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .bind(dto.role)
        .fetch_one(db)
        .await
        .map_err(|e| map_unique_violation(e, DomainError::DuplicateEmail))?;

        let tokens = Self::issue(user.id, &user.email, user.role, jwt_config)?;
        track_user_registered(user.role.as_str());
        tracing::info!(user_id = %user.id, "User registered");

        Ok(AuthResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user,
        })
    }

    /// Unknown email and wrong password produce the same error.
    #[instrument(skip(db, dto, jwt_config), fields(email = %dto.email))]
    pub async fn login(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<AuthResponse, AppError> {
        let email = normalize_email(&dto.email);

        let Some(credentials) = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, password_hash, status FROM users WHERE LOWER(email) = $1",
        )
        .bind(&email)
        .fetch_optional(db)
        .await?
        else {
            track_login_failure("unknown_email");
            return Err(DomainError::InvalidCredentials.into());
        };

        if !verify_password(&dto.password, &credentials.password_hash)? {
            track_login_failure("wrong_password");
            return Err(DomainError::InvalidCredentials.into());
        }

        if credentials.status != UserStatus::Active {
            track_login_failure("inactive");
            return Err(DomainError::AccountNotActive.into());
        }

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET last_login = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(credentials.id)
        .fetch_one(db)
        .await?;

        let tokens = Self::issue(user.id, &user.email, user.role, jwt_config)?;
        track_login_success(user.role.as_str());

        Ok(AuthResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user,
        })
    }

    /// Rotates a refresh token into a brand-new pair built from the current
    /// user record.
    #[instrument(skip_all)]
    pub async fn refresh(
        db: &PgPool,
        refresh_token: &str,
        jwt_config: &JwtConfig,
    ) -> Result<TokenPair, AppError> {
        let claims = verify_refresh_token(refresh_token, jwt_config)
            .map_err(|_| DomainError::InvalidRefreshToken)?;
        let user_id = claims.user_id()?;

        let identity = sqlx::query_as::<_, TokenIdentity>(
            "SELECT id, email, role, status FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .filter(|u| u.status == UserStatus::Active)
        .ok_or(DomainError::InvalidRefreshToken)?;

        Self::issue(identity.id, &identity.email, identity.role, jwt_config)
    }

    /// Succeeds whether or not the email is registered. A mail failure is
    /// reported, but the stored token stays valid.
    #[instrument(skip(db, mailer))]
    pub async fn forgot_password(db: &PgPool, email: &str, mailer: &Mailer) -> Result<(), AppError> {
        let email = normalize_email(email);

        let user: Option<(Uuid, String, String)> = sqlx::query_as(
            "SELECT id, email, first_name FROM users WHERE LOWER(email) = $1",
        )
        .bind(&email)
        .fetch_optional(db)
        .await?;

        let Some((user_id, user_email, first_name)) = user else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let reset = reset_token::generate();
        sqlx::query(
            r#"UPDATE users
               SET reset_token_hash = $1, reset_token_expires = $2, updated_at = NOW()
               WHERE id = $3"#,
        )
        .bind(&reset.hash)
        .bind(reset.expires_at)
        .bind(user_id)
        .execute(db)
        .await?;
        track_password_reset("requested");

        let html = password_reset_template(&first_name, &mailer.reset_link(&reset.token));
        mailer.send(&user_email, "Password Reset Request", &html).await
    }

    /// Replaces the password and clears the reset fields in one statement.
    #[instrument(skip_all)]
    pub async fn reset_password(
        db: &PgPool,
        dto: ResetPasswordRequest,
        mailer: &Mailer,
    ) -> Result<(), AppError> {
        let password_hash = hash_password(&dto.new_password)?;

        let (email, first_name): (String, String) = sqlx::query_as(
            r#"UPDATE users
               SET password_hash = $1,
                   reset_token_hash = NULL,
                   reset_token_expires = NULL,
                   updated_at = NOW()
               WHERE reset_token_hash = $2 AND reset_token_expires > NOW()
               RETURNING email, first_name"#,
        )
        .bind(&password_hash)
        .bind(reset_token::hash(&dto.token))
        .fetch_optional(db)
        .await?
        .ok_or(DomainError::InvalidOrExpiredToken)?;
        track_password_reset("completed");

        if let Err(e) = mailer
            .send(&email, "Password Changed", &password_changed_template(&first_name))
            .await
        {
            tracing::warn!(error = %e.error, "Password change confirmation not delivered");
        }

        Ok(())
    }

    #[instrument(skip(db, dto))]
    pub async fn change_password(
        db: &PgPool,
        user_id: Uuid,
        dto: ChangePasswordDto,
    ) -> Result<(), AppError> {
        let current_hash: String =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(db)
                .await?
                .ok_or(DomainError::NotFound("User"))?;

        if !verify_password(&dto.current_password, &current_hash)? {
            return Err(DomainError::IncorrectCurrentPassword.into());
        }

        let new_hash = hash_password(&dto.new_password)?;
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(&new_hash)
            .bind(user_id)
            .execute(db)
            .await?;

        Ok(())
    }

    pub async fn me(db: &PgPool, user_id: Uuid) -> Result<User, AppError> {
        UserService::get_user(db, user_id).await
    }

    pub async fn update_profile(
        db: &PgPool,
        user_id: Uuid,
        dto: UpdateProfileDto,
    ) -> Result<User, AppError> {
        UserService::update_profile(db, user_id, dto).await
    }
}
