//! Attendance domain models and DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use schoolhub_core::serde::deserialize_optional_uuid;
use schoolhub_core::{PaginationMeta, PaginationParams, SortOrder};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::classes::ClassSummary;
use crate::users::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attendance_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attendance {
    pub id: Uuid,
    pub date: NaiveDate,
    pub class_id: Uuid,
    pub student_id: Uuid,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
    pub marked_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceDetails {
    #[serde(flatten)]
    pub attendance: Attendance,
    pub student: Option<UserSummary>,
    pub class: Option<ClassSummary>,
    pub marker: Option<UserSummary>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MarkAttendanceDto {
    pub date: NaiveDate,
    pub class_id: Uuid,
    pub student_id: Uuid,
    pub status: AttendanceStatus,
    #[validate(length(max = 500))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AttendanceRecordDto {
    pub student_id: Uuid,
    pub status: AttendanceStatus,
    #[validate(length(max = 500))]
    pub remarks: Option<String>,
}

/// Marks a whole class for one day. Existing marks for the same students on
/// that date are overwritten.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkAttendanceDto {
    pub class_id: Uuid,
    pub date: NaiveDate,
    #[validate(
        length(min = 1, message = "At least one attendance record is required"),
        nested
    )]
    pub records: Vec<AttendanceRecordDto>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAttendanceDto {
    pub status: Option<AttendanceStatus>,
    #[validate(length(max = 500))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    pub status: Option<AttendanceStatus>,
    /// Inclusive lower bound on the attendance date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the attendance date
    pub to: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedAttendanceResponse {
    pub data: Vec<Attendance>,
    pub meta: PaginationMeta,
}

/// Optional window for a student's attendance summary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceSummaryParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Attendance totals for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub student_id: Uuid,
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
    /// Share of days attended (present or late) as a percentage
    pub attendance_rate: f64,
}

impl AttendanceSummary {
    pub fn from_statuses(student_id: Uuid, statuses: &[AttendanceStatus]) -> Self {
        let count = |s: AttendanceStatus| statuses.iter().filter(|&&x| x == s).count() as i64;
        let total = statuses.len() as i64;
        let present = count(AttendanceStatus::Present);
        let late = count(AttendanceStatus::Late);

        let attendance_rate = if total == 0 {
            0.0
        } else {
            ((present + late) as f64 / total as f64 * 10000.0).round() / 100.0
        };

        Self {
            student_id,
            total,
            present,
            absent: count(AttendanceStatus::Absent),
            late,
            excused: count(AttendanceStatus::Excused),
            attendance_rate,
        }
    }
}
