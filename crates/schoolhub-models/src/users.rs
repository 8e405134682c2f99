//! User domain models and DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use schoolhub_auth::UserRole;
use schoolhub_core::serde::deserialize_optional_uuid;
use schoolhub_core::{PaginationMeta, PaginationParams, SortOrder};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Account status. Only `Active` users may log in or refresh tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

/// A user as exposed by the API. Credential and reset-token columns are never
/// selected into this struct.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub status: UserStatus,
    /// Class the student currently belongs to
    pub class_id: Option<Uuid>,
    /// Parent account linked to a student
    pub parent_id: Option<Uuid>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list matching [`User`], shared by every query that returns one.
pub const USER_COLUMNS: &str = "id, email, first_name, last_name, role, status, class_id, \
     parent_id, phone, date_of_birth, address, last_login, created_at, updated_at";

/// Compact user reference embedded in populated responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
}

/// Emails are unique case-insensitively, so they are stored lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserDto {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub role: UserRole,
    pub status: Option<UserStatus>,
    pub parent_id: Option<Uuid>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
}

/// Admin-side user update. Absent fields are left unchanged. A user's role is
/// fixed at creation, so it is not part of this payload and a `role` key is
/// ignored.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserDto {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    pub status: Option<UserStatus>,
    pub parent_id: Option<Uuid>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
}

/// Self-service profile update. Role, status, and email are not editable here.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordDto {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserFilterParams {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    /// Matches first name, last name, or email
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedUsersResponse {
    pub data: Vec<User>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane.Doe@School.TEST "), "jane.doe@school.test");
    }

    #[test]
    fn test_create_user_dto_validation() {
        let dto = CreateUserDto {
            email: "teacher@school.test".to_string(),
            password: "password123".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role: UserRole::Teacher,
            status: None,
            parent_id: None,
            phone: None,
            date_of_birth: None,
            address: None,
        };
        assert!(dto.validate().is_ok());

        let short_password = CreateUserDto {
            password: "short".to_string(),
            ..dto.clone()
        };
        assert!(short_password.validate().is_err());

        let bad_email = CreateUserDto {
            email: "not-an-email".to_string(),
            ..dto
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_update_profile_allows_empty_body() {
        assert!(UpdateProfileDto::default().validate().is_ok());

        let blank_name = UpdateProfileDto {
            first_name: Some(String::new()),
            ..Default::default()
        };
        assert!(blank_name.validate().is_err());
    }

    #[test]
    fn test_filter_params_from_query_strings() {
        let json = r#"{"role":"TEACHER","status":"ACTIVE","class_id":"","search":"ada","limit":"5","sort_order":"asc"}"#;
        let params: UserFilterParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.role, Some(UserRole::Teacher));
        assert_eq!(params.status, Some(UserStatus::Active));
        assert!(params.class_id.is_none());
        assert_eq!(params.pagination.limit(), 5);
        assert_eq!(params.sort_order, Some(SortOrder::Asc));
    }

    #[test]
    fn test_update_user_ignores_role_key() {
        let dto: UpdateUserDto =
            serde_json::from_str(r#"{"role":"STUDENT","first_name":"Grace"}"#).unwrap();
        assert_eq!(dto.first_name.as_deref(), Some("Grace"));
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&UserStatus::Suspended).unwrap(),
            r#""SUSPENDED""#
        );
    }
}
