//! Exam domain models and DTOs.

use chrono::{DateTime, Utc};
use schoolhub_core::serde::deserialize_optional_uuid;
use schoolhub_core::{DomainError, PaginationMeta, PaginationParams, SortOrder};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::classes::ClassSummary;
use crate::subjects::SubjectSummary;
use crate::users::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "exam_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExamType {
    Quiz,
    Midterm,
    Final,
    Assignment,
    Practical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "exam_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExamStatus {
    #[default]
    Scheduled,
    Ongoing,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Exam {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub class_id: Uuid,
    pub subject_id: Uuid,
    pub exam_date: DateTime<Utc>,
    pub max_marks: f64,
    /// Duration in minutes
    pub duration: i32,
    pub exam_type: ExamType,
    pub status: ExamStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExamSummary {
    pub id: Uuid,
    pub title: String,
    pub max_marks: f64,
    pub exam_type: ExamType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamDetails {
    #[serde(flatten)]
    pub exam: Exam,
    pub class: Option<ClassSummary>,
    pub subject: Option<SubjectSummary>,
    pub creator: Option<UserSummary>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateExamDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub class_id: Uuid,
    pub subject_id: Uuid,
    pub exam_date: DateTime<Utc>,
    #[validate(range(exclusive_min = 0.0, message = "Maximum marks must be greater than 0"))]
    pub max_marks: f64,
    #[validate(range(min = 1, max = 600))]
    pub duration: i32,
    pub exam_type: ExamType,
    pub status: Option<ExamStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateExamDto {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub class_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub exam_date: Option<DateTime<Utc>>,
    #[validate(range(exclusive_min = 0.0, message = "Maximum marks must be greater than 0"))]
    pub max_marks: Option<f64>,
    #[validate(range(min = 1, max = 600))]
    pub duration: Option<i32>,
    pub exam_type: Option<ExamType>,
    pub status: Option<ExamStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExamFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub subject_id: Option<Uuid>,
    pub status: Option<ExamStatus>,
    pub exam_type: Option<ExamType>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedExamsResponse {
    pub data: Vec<Exam>,
    pub meta: PaginationMeta,
}

pub fn ensure_positive_max_marks(max_marks: f64) -> Result<(), DomainError> {
    if max_marks > 0.0 {
        Ok(())
    } else {
        Err(DomainError::rule("Maximum marks must be greater than 0"))
    }
}

/// The exam's subject must be one of the subjects assigned to its class.
pub fn ensure_subject_in_class(subject_class_id: Uuid, class_id: Uuid) -> Result<(), DomainError> {
    if subject_class_id == class_id {
        Ok(())
    } else {
        Err(DomainError::rule(
            "Subject is not assigned to the selected class",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_marks_must_be_positive() {
        assert!(ensure_positive_max_marks(100.0).is_ok());
        assert!(ensure_positive_max_marks(0.5).is_ok());
        assert!(ensure_positive_max_marks(0.0).is_err());
        assert!(ensure_positive_max_marks(-10.0).is_err());
    }

    #[test]
    fn test_subject_must_match_class() {
        let class_id = Uuid::new_v4();
        assert!(ensure_subject_in_class(class_id, class_id).is_ok());
        assert!(ensure_subject_in_class(Uuid::new_v4(), class_id).is_err());
    }

    #[test]
    fn test_create_exam_dto_rejects_zero_marks() {
        let dto = CreateExamDto {
            title: "Unit test 1".to_string(),
            description: None,
            class_id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            exam_date: Utc::now(),
            max_marks: 0.0,
            duration: 45,
            exam_type: ExamType::Quiz,
            status: None,
        };
        assert!(dto.validate().is_err());
        assert!(
            CreateExamDto {
                max_marks: 50.0,
                ..dto
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn test_exam_type_serialization() {
        assert_eq!(
            serde_json::to_string(&ExamType::Midterm).unwrap(),
            r#""MIDTERM""#
        );
        assert_eq!(ExamStatus::default(), ExamStatus::Scheduled);
    }
}
