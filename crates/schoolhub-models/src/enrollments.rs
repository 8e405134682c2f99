//! Enrollment domain models, DTOs, and the subject-subset rule.

use chrono::{DateTime, NaiveDate, Utc};
use schoolhub_core::serde::{deserialize_optional_i32, deserialize_optional_uuid};
use schoolhub_core::{DomainError, PaginationMeta, PaginationParams, SortOrder};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::classes::ClassSummary;
use crate::subjects::SubjectSummary;
use crate::users::UserSummary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "enrollment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    #[default]
    Active,
    Completed,
    Dropped,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub academic_year: i32,
    pub status: EnrollmentStatus,
    pub enrollment_date: NaiveDate,
    pub subject_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentDetails {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub student: Option<UserSummary>,
    pub class: Option<ClassSummary>,
    pub subjects: Vec<SubjectSummary>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEnrollmentDto {
    pub student_id: Uuid,
    pub class_id: Uuid,
    #[validate(range(min = 2000, max = 2100))]
    pub academic_year: i32,
    #[serde(default)]
    pub subject_ids: Vec<Uuid>,
    pub status: Option<EnrollmentStatus>,
    /// Defaults to today
    pub enrollment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEnrollmentDto {
    pub status: Option<EnrollmentStatus>,
    /// Replaces the whole subject list when present
    pub subject_ids: Option<Vec<Uuid>>,
    pub enrollment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EnrollmentSubjectDto {
    pub subject_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_i32")]
    pub academic_year: Option<i32>,
    pub status: Option<EnrollmentStatus>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedEnrollmentsResponse {
    pub data: Vec<Enrollment>,
    pub meta: PaginationMeta,
}

/// Every requested subject must be one of the class's subjects.
pub fn ensure_subjects_in_class(
    requested: &[Uuid],
    class_subjects: &[Uuid],
) -> Result<(), DomainError> {
    if requested.iter().all(|id| class_subjects.contains(id)) {
        Ok(())
    } else {
        Err(DomainError::rule(
            "All subjects must belong to the enrollment's class",
        ))
    }
}

/// Drops repeated ids while keeping the caller's order.
pub fn dedup_subjects(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen
}
