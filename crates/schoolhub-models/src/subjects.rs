//! Subject domain models and DTOs.

use chrono::{DateTime, Utc};
use schoolhub_core::serde::deserialize_optional_uuid;
use schoolhub_core::{PaginationMeta, PaginationParams, SortOrder};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::classes::ClassSummary;
use crate::users::UserSummary;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    /// Unique within the owning class
    pub code: String,
    pub description: Option<String>,
    pub credits: Option<i32>,
    pub class_id: Uuid,
    pub teacher_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SubjectSummary {
    pub id: Uuid,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectDetails {
    #[serde(flatten)]
    pub subject: Subject,
    pub class: Option<ClassSummary>,
    pub teacher: Option<UserSummary>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSubjectDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(range(min = 0, max = 30))]
    pub credits: Option<i32>,
    pub class_id: Uuid,
    pub teacher_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSubjectDto {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub code: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(range(min = 0, max = 30))]
    pub credits: Option<i32>,
    pub teacher_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub teacher_id: Option<Uuid>,
    /// Matches name or code
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedSubjectsResponse {
    pub data: Vec<Subject>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_subject_dto_validation() {
        let dto = CreateSubjectDto {
            name: "Mathematics".to_string(),
            code: "MATH-5A".to_string(),
            description: None,
            credits: Some(4),
            class_id: Uuid::new_v4(),
            teacher_id: Uuid::new_v4(),
        };
        assert!(dto.validate().is_ok());

        let empty_code = CreateSubjectDto {
            code: String::new(),
            ..dto.clone()
        };
        assert!(empty_code.validate().is_err());

        let negative_credits = CreateSubjectDto {
            credits: Some(-1),
            ..dto
        };
        assert!(negative_credits.validate().is_err());
    }

    #[test]
    fn test_filter_by_class() {
        let id = Uuid::new_v4();
        let json = format!(r#"{{"class_id":"{}"}}"#, id);
        let params: SubjectFilterParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params.class_id, Some(id));
        assert_eq!(params.pagination.limit(), 10);
    }
}
