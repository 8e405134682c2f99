//! Application error types.
//!
//! [`AppError`] is the error type returned by every service and handler. It
//! pairs an HTTP status with an [`anyhow::Error`] and renders as
//! `{"error": "<message>"}`.
//!
//! Business-rule failures are expressed as [`DomainError`] variants. Converting
//! a `DomainError` into an `AppError` (directly or through `?`) keeps the
//! variant inside the wrapped error and picks the matching status, so callers
//! can still inspect the failure with [`AppError::domain`].

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

/// Named failures of the authentication flows and relational-integrity rules.
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum DomainError {
    #[error("A user with this email already exists")]
    DuplicateEmail,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Account is not active")]
    AccountNotActive,
    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,
    #[error("Invalid or expired reset token")]
    InvalidOrExpiredToken,
    #[error("Current password is incorrect")]
    IncorrectCurrentPassword,
    #[error("Invalid or expired token")]
    TokenInvalid,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BusinessRule(String),
    #[error("Student is already enrolled in this class")]
    AlreadyEnrolled,
    #[error("Class has reached its maximum capacity")]
    CapacityExceeded,
    #[error("Student is already enrolled in this subject")]
    AlreadyEnrolledInSubject,
    #[error("Grade already exists for this student in this exam")]
    DuplicateGrade,
    #[error("Marks cannot exceed the exam maximum of {max_marks}")]
    MarksExceedMaximum { max_marks: f64 },
    #[error("Failed to send email")]
    EmailDeliveryFailed,
}

impl DomainError {
    pub fn status(&self) -> StatusCode {
        match self {
            DomainError::InvalidCredentials
            | DomainError::AccountNotActive
            | DomainError::InvalidRefreshToken
            | DomainError::TokenInvalid
            | DomainError::Unauthenticated => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::EmailDeliveryFailed => StatusCode::INTERNAL_SERVER_ERROR,
            DomainError::DuplicateEmail
            | DomainError::InvalidOrExpiredToken
            | DomainError::IncorrectCurrentPassword
            | DomainError::Conflict(_)
            | DomainError::Validation(_)
            | DomainError::BusinessRule(_)
            | DomainError::AlreadyEnrolled
            | DomainError::CapacityExceeded
            | DomainError::AlreadyEnrolledInSubject
            | DomainError::DuplicateGrade
            | DomainError::MarksExceedMaximum { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        DomainError::Conflict(message.into())
    }

    pub fn rule(message: impl Into<String>) -> Self {
        DomainError::BusinessRule(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        DomainError::Forbidden(message.into())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, anyhow::anyhow!(message.into()))
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, anyhow::anyhow!(message.into()))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, anyhow::anyhow!(message.into()))
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    /// Returns the domain failure carried by this error, if any.
    pub fn domain(&self) -> Option<&DomainError> {
        self.error.downcast_ref::<DomainError>()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.status.is_server_error() && self.domain().is_none() {
            tracing::error!(error = ?self.error, "Internal server error");
            "Internal server error".to_string()
        } else {
            self.error.to_string()
        };

        (self.status, Json(json!({ "error": message }))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        let error = err.into();
        let status = error
            .downcast_ref::<DomainError>()
            .map(DomainError::status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        AppError { status, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fails_with(err: DomainError) -> Result<(), AppError> {
        Err::<(), _>(err)?;
        Ok(())
    }

    #[test]
    fn test_domain_error_keeps_status_through_question_mark() {
        let err = fails_with(DomainError::CapacityExceeded).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.domain(), Some(&DomainError::CapacityExceeded));
    }

    #[test]
    fn test_invalid_credentials_is_unauthorized() {
        let err: AppError = DomainError::InvalidCredentials.into();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.error.to_string(), "Invalid email or password");
    }

    #[test]
    fn test_forbidden_and_not_found_statuses() {
        assert_eq!(
            DomainError::forbidden("nope").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            DomainError::NotFound("Class").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(DomainError::NotFound("Class").to_string(), "Class not found");
    }

    #[test]
    fn test_plain_errors_become_internal() {
        let err: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.domain().is_none());
    }

    #[test]
    fn test_marks_message_includes_maximum() {
        let err = DomainError::MarksExceedMaximum { max_marks: 100.0 };
        assert_eq!(err.to_string(), "Marks cannot exceed the exam maximum of 100");
    }

    #[test]
    fn test_email_failure_is_server_error_with_message() {
        let err: AppError = DomainError::EmailDeliveryFailed.into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.domain(), Some(&DomainError::EmailDeliveryFailed));
    }
}
