//! Announcement domain models, audience targeting, and publication lifecycle.

use chrono::{DateTime, Utc};
use schoolhub_core::{DomainError, PaginationMeta, PaginationParams, SortOrder};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::users::UserSummary;

/// Who an announcement is addressed to. `Class` targets are class ids;
/// `Role` and `User` targets are user ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "announcement_audience", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnnouncementAudience {
    All,
    Class,
    Role,
    User,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "announcement_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnnouncementPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "announcement_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnnouncementStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl AnnouncementStatus {
    /// Checks a status change. Publishing twice or archiving twice is a conflict.
    pub fn transition_to(self, next: AnnouncementStatus) -> Result<AnnouncementStatus, DomainError> {
        match (self, next) {
            (AnnouncementStatus::Published, AnnouncementStatus::Published) => Err(
                DomainError::conflict("Announcement is already published"),
            ),
            (AnnouncementStatus::Archived, AnnouncementStatus::Archived) => Err(
                DomainError::conflict("Announcement is already archived"),
            ),
            (_, AnnouncementStatus::Draft) if self != AnnouncementStatus::Draft => Err(
                DomainError::rule("An announcement cannot return to draft"),
            ),
            _ => Ok(next),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub audience: AnnouncementAudience,
    pub target_ids: Vec<Uuid>,
    pub priority: AnnouncementPriority,
    pub status: AnnouncementStatus,
    /// Set on the first transition to `PUBLISHED` and never changed after
    pub published_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementDetails {
    #[serde(flatten)]
    pub announcement: Announcement,
    pub author: Option<UserSummary>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAnnouncementDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    pub audience: AnnouncementAudience,
    #[serde(default)]
    pub target_ids: Vec<Uuid>,
    pub priority: Option<AnnouncementPriority>,
    /// `DRAFT` (default) or `PUBLISHED`
    pub status: Option<AnnouncementStatus>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAnnouncementDto {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub content: Option<String>,
    pub audience: Option<AnnouncementAudience>,
    pub target_ids: Option<Vec<Uuid>>,
    pub priority: Option<AnnouncementPriority>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnouncementFilterParams {
    pub audience: Option<AnnouncementAudience>,
    pub priority: Option<AnnouncementPriority>,
    /// Ignored for non-admin readers, who only see published announcements
    pub status: Option<AnnouncementStatus>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedAnnouncementsResponse {
    pub data: Vec<Announcement>,
    pub meta: PaginationMeta,
}

/// Checks the audience/target pairing and returns the targets to store.
///
/// `ALL` never keeps targets; every other audience needs at least one.
pub fn normalize_targets(
    audience: AnnouncementAudience,
    target_ids: Vec<Uuid>,
) -> Result<Vec<Uuid>, DomainError> {
    match audience {
        AnnouncementAudience::All => Ok(Vec::new()),
        _ if target_ids.is_empty() => Err(DomainError::Validation(
            "At least one target is required when audience is not ALL".to_string(),
        )),
        _ => {
            let mut targets = target_ids;
            targets.sort();
            targets.dedup();
            Ok(targets)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_audience_requires_targets() {
        let err = normalize_targets(AnnouncementAudience::Class, vec![]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(err.status().as_u16(), 400);
    }

    #[test]
    fn test_all_audience_drops_targets() {
        let targets = normalize_targets(AnnouncementAudience::All, vec![Uuid::new_v4()]).unwrap();
        assert!(targets.is_empty());
    }

    #[test]
    fn test_targets_are_deduplicated() {
        let id = Uuid::new_v4();
        let targets = normalize_targets(AnnouncementAudience::User, vec![id, id]).unwrap();
        assert_eq!(targets, vec![id]);
    }

    #[test]
    fn test_status_transitions() {
        use AnnouncementStatus::*;
        assert_eq!(Draft.transition_to(Published), Ok(Published));
        assert_eq!(Published.transition_to(Archived), Ok(Archived));
        assert_eq!(Archived.transition_to(Published), Ok(Published));
        assert!(Published.transition_to(Published).is_err());
        assert!(Archived.transition_to(Archived).is_err());
        assert!(Published.transition_to(Draft).is_err());
    }
}
