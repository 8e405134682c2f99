use anyhow::Context;
use sqlx::PgPool;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use schoolhub_core::{AppError, DomainError};
use schoolhub_models::announcements::{
    Announcement, AnnouncementAudience, AnnouncementDetails, AnnouncementFilterParams,
    AnnouncementStatus, CreateAnnouncementDto, PaginatedAnnouncementsResponse,
    UpdateAnnouncementDto, normalize_targets,
};

use crate::middleware::auth::AuthUser;
use crate::middleware::role::check_owner_or_admin;
use crate::utils::integrity::{ensure_all_exist, find_user_summary, like_pattern, order_clause};

const ANNOUNCEMENT_COLUMNS: &str = "a.id, a.title, a.content, a.audience, a.target_ids, \
     a.priority, a.status, a.published_at, a.expires_at, a.author_id, a.created_at, a.updated_at";

const FILTER_CLAUSE: &str = r#"($1::announcement_audience IS NULL OR a.audience = $1)
      AND ($2::announcement_priority IS NULL OR a.priority = $2)
      AND ($3::announcement_status IS NULL OR a.status = $3)
      AND ($4::text IS NULL OR a.title ILIKE $4 OR a.content ILIKE $4)"#;

/// Rows a viewer may read: everything for admins, their own announcements,
/// and published, unexpired announcements addressed to them. `CLASS`
/// announcements reach the class's students, their parents and its teacher.
///
/// Binds `$first` (is admin), `$first + 1` (viewer id) and `$first + 2`
/// (viewer role).
fn visibility_clause(first: usize) -> String {
    let admin = first;
    let viewer = first + 1;
    let role = first + 2;
    format!(
        r#"(${admin}::bool
      OR a.author_id = ${viewer}
      OR (a.status = 'PUBLISHED'
          AND (a.expires_at IS NULL OR a.expires_at > NOW())
          AND (a.audience = 'ALL'
               OR (a.audience = 'USER' AND ${viewer} = ANY(a.target_ids))
               OR (a.audience = 'ROLE' AND (${viewer} = ANY(a.target_ids)
                   OR EXISTS (SELECT 1 FROM users t
                              WHERE t.id = ANY(a.target_ids) AND t.role = ${role}::user_role)))
               OR (a.audience = 'CLASS' AND (
                   EXISTS (SELECT 1 FROM class_students cs
                           WHERE cs.class_id = ANY(a.target_ids)
                             AND (cs.student_id = ${viewer}
                                  OR cs.student_id IN (SELECT k.id FROM users k WHERE k.parent_id = ${viewer})))
                   OR EXISTS (SELECT 1 FROM classes c
                              WHERE c.id = ANY(a.target_ids) AND c.teacher_id = ${viewer}))))))"#
    )
}

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("title", "a.title"),
    ("priority", "a.priority"),
    ("published_at", "a.published_at"),
    ("expires_at", "a.expires_at"),
    ("created_at", "a.created_at"),
];

pub struct AnnouncementService;

impl AnnouncementService {
    async fn fetch_announcement(db: &PgPool, id: Uuid) -> Result<Announcement, AppError> {
        let announcement = sqlx::query_as::<_, Announcement>(&format!(
            "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements a WHERE a.id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch announcement")?
        .ok_or(DomainError::NotFound("Announcement"))?;
        Ok(announcement)
    }

    /// Targets must name existing classes for `CLASS` and existing users for
    /// `ROLE` and `USER`.
    async fn resolve_targets(
        db: &PgPool,
        audience: AnnouncementAudience,
        target_ids: Vec<Uuid>,
    ) -> Result<Vec<Uuid>, AppError> {
        let targets = normalize_targets(audience, target_ids)?;
        match audience {
            AnnouncementAudience::All => {}
            AnnouncementAudience::Class => {
                ensure_all_exist(db, "classes", &targets, "Class").await?
            }
            AnnouncementAudience::Role | AnnouncementAudience::User => {
                ensure_all_exist(db, "users", &targets, "User").await?
            }
        }
        Ok(targets)
    }

    #[instrument(skip(db, dto), fields(audience = ?dto.audience, db.operation = "INSERT", db.table = "announcements"))]
    pub async fn create_announcement(
        db: &PgPool,
        dto: CreateAnnouncementDto,
        author_id: Uuid,
    ) -> Result<Announcement, AppError> {
        let targets = Self::resolve_targets(db, dto.audience, dto.target_ids).await?;

        let status = dto.status.unwrap_or_default();
        if status == AnnouncementStatus::Archived {
            return Err(DomainError::rule("New announcements must be DRAFT or PUBLISHED").into());
        }

        let announcement = sqlx::query_as::<_, Announcement>(&format!(
            r#"INSERT INTO announcements AS a
                   (title, content, audience, target_ids, priority, status, published_at,
                    expires_at, author_id)
               VALUES ($1, $2, $3, $4, $5, $6,
                       CASE WHEN $6 = 'PUBLISHED'::announcement_status THEN NOW() END,
                       $7, $8)
               RETURNING {ANNOUNCEMENT_COLUMNS}"#
        ))
        .bind(dto.title.trim())
        .bind(&dto.content)
        .bind(dto.audience)
        .bind(&targets)
        .bind(dto.priority.unwrap_or_default())
        .bind(status)
        .bind(dto.expires_at)
        .bind(author_id)
        .fetch_one(db)
        .await
        .context("Failed to insert announcement")?;

        info!(announcement.id = %announcement.id, status = ?announcement.status, "Announcement created");
        Ok(announcement)
    }

    /// Lists announcements the viewer may read. Non-admin readers cannot
    /// filter by status.
    #[instrument(skip(db, filters, viewer), fields(viewer = %viewer.0.sub, db.operation = "SELECT", db.table = "announcements"))]
    pub async fn list_announcements(
        db: &PgPool,
        filters: AnnouncementFilterParams,
        viewer: &AuthUser,
    ) -> Result<PaginatedAnnouncementsResponse, AppError> {
        let viewer_id = viewer.user_id()?;
        let is_admin = viewer.is_admin();
        let status = if is_admin { filters.status } else { None };
        let search = like_pattern(filters.search.as_deref());

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM announcements a WHERE {FILTER_CLAUSE} AND {}",
            visibility_clause(5)
        ))
        .bind(filters.audience)
        .bind(filters.priority)
        .bind(status)
        .bind(&search)
        .bind(is_admin)
        .bind(viewer_id)
        .bind(viewer.role())
        .fetch_one(db)
        .await
        .context("Failed to count announcements")?;

        let order = order_clause(
            filters.sort_by.as_deref(),
            filters.sort_order,
            SORT_COLUMNS,
            "a.created_at",
        );
        let announcements = sqlx::query_as::<_, Announcement>(&format!(
            r#"SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements a
               WHERE {FILTER_CLAUSE} AND {visibility}
               {order} LIMIT $8 OFFSET $9"#,
            visibility = visibility_clause(5)
        ))
        .bind(filters.audience)
        .bind(filters.priority)
        .bind(status)
        .bind(&search)
        .bind(is_admin)
        .bind(viewer_id)
        .bind(viewer.role())
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch announcements")?;

        debug!(total, returned = announcements.len(), "Announcements fetched");

        Ok(PaginatedAnnouncementsResponse {
            data: announcements,
            meta: filters.pagination.meta(total),
        })
    }

    /// Announcements the viewer may not read are reported as missing.
    #[instrument(skip(db, viewer), fields(db.operation = "SELECT", db.table = "announcements"))]
    pub async fn get_announcement(
        db: &PgPool,
        id: Uuid,
        viewer: &AuthUser,
    ) -> Result<AnnouncementDetails, AppError> {
        let announcement = sqlx::query_as::<_, Announcement>(&format!(
            r#"SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements a
               WHERE a.id = $1 AND {visibility}"#,
            visibility = visibility_clause(2)
        ))
        .bind(id)
        .bind(viewer.is_admin())
        .bind(viewer.user_id()?)
        .bind(viewer.role())
        .fetch_optional(db)
        .await
        .context("Failed to fetch announcement")?
        .ok_or(DomainError::NotFound("Announcement"))?;

        let author = find_user_summary(db, announcement.author_id).await?;
        Ok(AnnouncementDetails {
            announcement,
            author,
        })
    }

    #[instrument(skip(db, dto, editor), fields(db.operation = "UPDATE", db.table = "announcements"))]
    pub async fn update_announcement(
        db: &PgPool,
        id: Uuid,
        dto: UpdateAnnouncementDto,
        editor: &AuthUser,
    ) -> Result<Announcement, AppError> {
        let current = Self::fetch_announcement(db, id).await?;
        check_owner_or_admin(
            editor,
            current.author_id,
            "Only the author or an admin can modify this announcement",
        )?;

        let audience = dto.audience.unwrap_or(current.audience);
        let targets = match (dto.audience, dto.target_ids) {
            (None, None) => current.target_ids,
            (_, Some(target_ids)) => Self::resolve_targets(db, audience, target_ids).await?,
            (Some(_), None) => Self::resolve_targets(db, audience, current.target_ids).await?,
        };

        let announcement = sqlx::query_as::<_, Announcement>(&format!(
            r#"UPDATE announcements AS a SET
                   title = COALESCE($2, a.title),
                   content = COALESCE($3, a.content),
                   audience = $4,
                   target_ids = $5,
                   priority = COALESCE($6, a.priority),
                   expires_at = COALESCE($7, a.expires_at),
                   updated_at = NOW()
               WHERE a.id = $1
               RETURNING {ANNOUNCEMENT_COLUMNS}"#
        ))
        .bind(id)
        .bind(dto.title.as_deref().map(str::trim))
        .bind(&dto.content)
        .bind(audience)
        .bind(&targets)
        .bind(dto.priority)
        .bind(dto.expires_at)
        .fetch_one(db)
        .await
        .context("Failed to update announcement")?;

        info!(announcement.id = %id, "Announcement updated");
        Ok(announcement)
    }

    #[instrument(skip(db, editor), fields(db.operation = "DELETE", db.table = "announcements"))]
    pub async fn delete_announcement(
        db: &PgPool,
        id: Uuid,
        editor: &AuthUser,
    ) -> Result<(), AppError> {
        let current = Self::fetch_announcement(db, id).await?;
        check_owner_or_admin(
            editor,
            current.author_id,
            "Only the author or an admin can delete this announcement",
        )?;

        sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete announcement")?;

        info!(announcement.id = %id, "Announcement deleted");
        Ok(())
    }

    /// `published_at` keeps the time of the first publication.
    #[instrument(skip(db, editor), fields(db.operation = "UPDATE", db.table = "announcements"))]
    pub async fn publish(db: &PgPool, id: Uuid, editor: &AuthUser) -> Result<Announcement, AppError> {
        Self::change_status(db, id, editor, AnnouncementStatus::Published).await
    }

    #[instrument(skip(db, editor), fields(db.operation = "UPDATE", db.table = "announcements"))]
    pub async fn archive(db: &PgPool, id: Uuid, editor: &AuthUser) -> Result<Announcement, AppError> {
        Self::change_status(db, id, editor, AnnouncementStatus::Archived).await
    }

    async fn change_status(
        db: &PgPool,
        id: Uuid,
        editor: &AuthUser,
        next: AnnouncementStatus,
    ) -> Result<Announcement, AppError> {
        let current = Self::fetch_announcement(db, id).await?;
        check_owner_or_admin(
            editor,
            current.author_id,
            "Only the author or an admin can modify this announcement",
        )?;
        let status = current.status.transition_to(next)?;

        let announcement = sqlx::query_as::<_, Announcement>(&format!(
            r#"UPDATE announcements AS a SET
                   status = $2,
                   published_at = CASE
                       WHEN $2 = 'PUBLISHED'::announcement_status THEN COALESCE(a.published_at, NOW())
                       ELSE a.published_at
                   END,
                   updated_at = NOW()
               WHERE a.id = $1
               RETURNING {ANNOUNCEMENT_COLUMNS}"#
        ))
        .bind(id)
        .bind(status)
        .fetch_one(db)
        .await
        .context("Failed to change announcement status")?;

        info!(announcement.id = %id, status = ?status, "Announcement status changed");
        Ok(announcement)
    }
}
