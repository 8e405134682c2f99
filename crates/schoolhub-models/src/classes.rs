//! Class domain models, DTOs, and capacity rules.

use chrono::{DateTime, Utc};
use schoolhub_core::serde::{deserialize_optional_i32, deserialize_optional_uuid};
use schoolhub_core::{DomainError, PaginationMeta, PaginationParams, SortOrder};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::subjects::SubjectSummary;
use crate::users::UserSummary;

pub const DEFAULT_CAPACITY: i32 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Class {
    pub id: Uuid,
    pub name: String,
    pub section: String,
    pub academic_year: i32,
    pub teacher_id: Uuid,
    pub capacity: i32,
    pub room: Option<String>,
    pub description: Option<String>,
    /// Number of students currently in the class
    pub student_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ClassSummary {
    pub id: Uuid,
    pub name: String,
    pub section: String,
    pub academic_year: i32,
}

/// A class with its teacher, students, and subjects resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDetails {
    #[serde(flatten)]
    pub class: Class,
    pub teacher: Option<UserSummary>,
    pub students: Vec<UserSummary>,
    pub subjects: Vec<SubjectSummary>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateClassDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 20))]
    pub section: String,
    #[validate(range(min = 2000, max = 2100))]
    pub academic_year: i32,
    pub teacher_id: Uuid,
    #[validate(range(min = 1, max = 500))]
    pub capacity: Option<i32>,
    #[validate(length(max = 50))]
    pub room: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateClassDto {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub section: Option<String>,
    #[validate(range(min = 2000, max = 2100))]
    pub academic_year: Option<i32>,
    pub teacher_id: Option<Uuid>,
    #[validate(range(min = 1, max = 500))]
    pub capacity: Option<i32>,
    #[validate(length(max = 50))]
    pub room: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClassStudentDto {
    pub student_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_i32")]
    pub academic_year: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub teacher_id: Option<Uuid>,
    /// Matches name or section
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedClassesResponse {
    pub data: Vec<Class>,
    pub meta: PaginationMeta,
}

/// A class with `member_count` students can take one more only while
/// `member_count < capacity`.
pub fn ensure_capacity(member_count: i64, capacity: i32) -> Result<(), DomainError> {
    if member_count >= i64::from(capacity) {
        return Err(DomainError::CapacityExceeded);
    }
    Ok(())
}

/// Rejects a capacity change that would leave the class over-full.
pub fn ensure_capacity_not_below(member_count: i64, new_capacity: i32) -> Result<(), DomainError> {
    if i64::from(new_capacity) < member_count {
        return Err(DomainError::rule(format!(
            "Capacity cannot be lower than the current number of students ({})",
            member_count
        )));
    }
    Ok(())
}

pub fn ensure_deletable(member_count: i64) -> Result<(), DomainError> {
    if member_count > 0 {
        return Err(DomainError::rule(
            "Cannot delete a class that still has students",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_boundary() {
        assert!(ensure_capacity(0, 2).is_ok());
        assert!(ensure_capacity(1, 2).is_ok());
        assert_eq!(ensure_capacity(2, 2), Err(DomainError::CapacityExceeded));
        assert_eq!(ensure_capacity(5, 2), Err(DomainError::CapacityExceeded));
    }

    #[test]
    fn test_capacity_cannot_drop_below_members() {
        assert!(ensure_capacity_not_below(10, 10).is_ok());
        assert!(ensure_capacity_not_below(0, 1).is_ok());
        let err = ensure_capacity_not_below(11, 10).unwrap_err();
        assert!(matches!(err, DomainError::BusinessRule(_)));
        assert!(err.to_string().contains("11"));
    }

    #[test]
    fn test_class_with_students_is_not_deletable() {
        assert!(ensure_deletable(0).is_ok());
        assert!(ensure_deletable(1).is_err());
    }

    #[test]
    fn test_create_class_dto_validation() {
        let dto = CreateClassDto {
            name: "Grade 5".to_string(),
            section: "A".to_string(),
            academic_year: 2024,
            teacher_id: Uuid::new_v4(),
            capacity: Some(30),
            room: None,
            description: None,
        };
        assert!(dto.validate().is_ok());

        let zero_capacity = CreateClassDto {
            capacity: Some(0),
            ..dto.clone()
        };
        assert!(zero_capacity.validate().is_err());

        let empty_section = CreateClassDto {
            section: String::new(),
            ..dto
        };
        assert!(empty_section.validate().is_err());
    }

    #[test]
    fn test_filter_params_parse_year() {
        let params: ClassFilterParams =
            serde_json::from_str(r#"{"academic_year":"2024","teacher_id":""}"#).unwrap();
        assert_eq!(params.academic_year, Some(2024));
        assert!(params.teacher_id.is_none());
    }

    #[test]
    fn test_class_details_flattens_class() {
        let now = Utc::now();
        let details = ClassDetails {
            class: Class {
                id: Uuid::new_v4(),
                name: "Grade 5".to_string(),
                section: "B".to_string(),
                academic_year: 2024,
                teacher_id: Uuid::new_v4(),
                capacity: DEFAULT_CAPACITY,
                room: Some("101".to_string()),
                description: None,
                student_count: 0,
                created_at: now,
                updated_at: now,
            },
            teacher: None,
            students: vec![],
            subjects: vec![],
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["name"], "Grade 5");
        assert_eq!(json["capacity"], 30);
        assert!(json["students"].as_array().unwrap().is_empty());
    }
}
