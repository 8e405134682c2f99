//! Grade domain models, letter-grade derivation, and mark bounds.

use chrono::{DateTime, Utc};
use schoolhub_core::serde::deserialize_optional_uuid;
use schoolhub_core::{DomainError, PaginationMeta, PaginationParams, SortOrder};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::exams::ExamSummary;
use crate::users::UserSummary;

/// Lower percentage bound for each letter, highest first.
const LETTER_BANDS: &[(f64, &str)] = &[
    (90.0, "A+"),
    (85.0, "A"),
    (80.0, "A-"),
    (75.0, "B+"),
    (70.0, "B"),
    (65.0, "B-"),
    (60.0, "C+"),
    (55.0, "C"),
    (50.0, "C-"),
    (45.0, "D"),
];

/// Derives the letter grade for `marks` out of `max_marks`.
pub fn letter_grade(marks: f64, max_marks: f64) -> &'static str {
    let percentage = percentage(marks, max_marks);
    LETTER_BANDS
        .iter()
        .find(|(min, _)| percentage >= *min)
        .map(|(_, letter)| *letter)
        .unwrap_or("F")
}

pub fn percentage(marks: f64, max_marks: f64) -> f64 {
    if max_marks <= 0.0 {
        return 0.0;
    }
    marks / max_marks * 100.0
}

pub fn ensure_marks_within(marks: f64, max_marks: f64) -> Result<(), DomainError> {
    if marks < 0.0 {
        return Err(DomainError::rule("Marks cannot be negative"));
    }
    if marks > max_marks {
        return Err(DomainError::MarksExceedMaximum { max_marks });
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Grade {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub student_id: Uuid,
    pub marks: f64,
    /// Letter grade derived from `marks`
    pub grade: String,
    pub remarks: Option<String>,
    pub graded_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeDetails {
    #[serde(flatten)]
    pub grade: Grade,
    pub exam: Option<ExamSummary>,
    pub student: Option<UserSummary>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGradeDto {
    pub exam_id: Uuid,
    pub student_id: Uuid,
    #[validate(range(min = 0.0, message = "Marks cannot be negative"))]
    pub marks: f64,
    #[validate(length(max = 500))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateGradeDto {
    #[validate(range(min = 0.0, message = "Marks cannot be negative"))]
    pub marks: Option<f64>,
    #[validate(length(max = 500))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GradeFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub exam_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedGradesResponse {
    pub data: Vec<Grade>,
    pub meta: PaginationMeta,
}

/// All grades of one student with the overall percentage across exams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentGradeReport {
    pub student: UserSummary,
    pub grades: Vec<GradeDetails>,
    pub total_marks: f64,
    pub total_max_marks: f64,
    pub overall_percentage: Option<f64>,
    pub overall_grade: Option<String>,
}

impl StudentGradeReport {
    pub fn new(student: UserSummary, grades: Vec<GradeDetails>) -> Self {
        let total_marks: f64 = grades.iter().map(|g| g.grade.marks).sum();
        let total_max_marks: f64 = grades
            .iter()
            .filter_map(|g| g.exam.as_ref().map(|e| e.max_marks))
            .sum();

        let (overall_percentage, overall_grade) = if total_max_marks > 0.0 {
            let pct = (percentage(total_marks, total_max_marks) * 100.0).round() / 100.0;
            (
                Some(pct),
                Some(letter_grade(total_marks, total_max_marks).to_string()),
            )
        } else {
            (None, None)
        };

        Self {
            student,
            grades,
            total_marks,
            total_max_marks,
            overall_percentage,
            overall_grade,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exams::ExamType;
    use schoolhub_auth::UserRole;

    #[test]
    fn test_letter_grade_bands() {
        assert_eq!(letter_grade(95.0, 100.0), "A+");
        assert_eq!(letter_grade(90.0, 100.0), "A+");
        assert_eq!(letter_grade(89.9, 100.0), "A");
        assert_eq!(letter_grade(80.0, 100.0), "A-");
        assert_eq!(letter_grade(75.0, 100.0), "B+");
        assert_eq!(letter_grade(70.0, 100.0), "B");
        assert_eq!(letter_grade(65.0, 100.0), "B-");
        assert_eq!(letter_grade(60.0, 100.0), "C+");
        assert_eq!(letter_grade(55.0, 100.0), "C");
        assert_eq!(letter_grade(52.0, 100.0), "C-");
        assert_eq!(letter_grade(45.0, 100.0), "D");
        assert_eq!(letter_grade(44.99, 100.0), "F");
        assert_eq!(letter_grade(0.0, 100.0), "F");
    }

    #[test]
    fn test_letter_grade_uses_percentage() {
        assert_eq!(letter_grade(18.0, 20.0), "A+");
        assert_eq!(letter_grade(10.0, 20.0), "C-");
    }

    #[test]
    fn test_marks_bounds() {
        assert!(ensure_marks_within(100.0, 100.0).is_ok());
        assert_eq!(
            ensure_marks_within(101.0, 100.0),
            Err(DomainError::MarksExceedMaximum { max_marks: 100.0 })
        );
        assert!(ensure_marks_within(-1.0, 100.0).is_err());
    }

    #[test]
    fn test_report_totals() {
        let student = UserSummary {
            id: Uuid::new_v4(),
            first_name: "Sam".to_string(),
            last_name: "Student".to_string(),
            email: "sam@school.test".to_string(),
            role: UserRole::Student,
        };
        let make = |marks: f64, max: f64| {
            let now = Utc::now();
            GradeDetails {
                grade: Grade {
                    id: Uuid::new_v4(),
                    exam_id: Uuid::new_v4(),
                    student_id: student.id,
                    marks,
                    grade: letter_grade(marks, max).to_string(),
                    remarks: None,
                    graded_by: Uuid::new_v4(),
                    created_at: now,
                    updated_at: now,
                },
                exam: Some(ExamSummary {
                    id: Uuid::new_v4(),
                    title: "Quiz".to_string(),
                    max_marks: max,
                    exam_type: ExamType::Quiz,
                }),
                student: None,
            }
        };

        let report = StudentGradeReport::new(student.clone(), vec![make(45.0, 50.0), make(40.0, 50.0)]);
        assert_eq!(report.total_marks, 85.0);
        assert_eq!(report.total_max_marks, 100.0);
        assert_eq!(report.overall_percentage, Some(85.0));
        assert_eq!(report.overall_grade.as_deref(), Some("A"));

        let empty = StudentGradeReport::new(student, vec![]);
        assert!(empty.overall_percentage.is_none());
    }
}
