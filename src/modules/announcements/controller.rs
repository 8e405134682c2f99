use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use schoolhub_core::AppError;
use schoolhub_models::announcements::{
    Announcement, AnnouncementDetails, AnnouncementFilterParams, CreateAnnouncementDto,
    PaginatedAnnouncementsResponse, UpdateAnnouncementDto,
};
use schoolhub_models::auth::MessageResponse;

use super::service::AnnouncementService;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireTeacher;
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

#[instrument(skip(state, dto))]
pub async fn create_announcement(
    State(state): State<AppState>,
    RequireTeacher(author): RequireTeacher,
    ValidatedJson(dto): ValidatedJson<CreateAnnouncementDto>,
) -> Result<(StatusCode, Json<Announcement>), AppError> {
    let announcement =
        AnnouncementService::create_announcement(&state.db, dto, author.user_id()?).await?;
    Ok((StatusCode::CREATED, Json(announcement)))
}

#[instrument(skip(state))]
pub async fn list_announcements(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedQuery(filters): ValidatedQuery<AnnouncementFilterParams>,
) -> Result<Json<PaginatedAnnouncementsResponse>, AppError> {
    let announcements =
        AnnouncementService::list_announcements(&state.db, filters, &auth_user).await?;
    Ok(Json(announcements))
}

#[instrument(skip(state))]
pub async fn get_announcement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AnnouncementDetails>, AppError> {
    let announcement = AnnouncementService::get_announcement(&state.db, id, &auth_user).await?;
    Ok(Json(announcement))
}

#[instrument(skip(state, dto))]
pub async fn update_announcement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateAnnouncementDto>,
) -> Result<Json<Announcement>, AppError> {
    let announcement =
        AnnouncementService::update_announcement(&state.db, id, dto, &auth_user).await?;
    Ok(Json(announcement))
}

#[instrument(skip(state))]
pub async fn delete_announcement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    AnnouncementService::delete_announcement(&state.db, id, &auth_user).await?;
    Ok(Json(MessageResponse::new("Announcement deleted successfully")))
}

#[instrument(skip(state))]
pub async fn publish_announcement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Announcement>, AppError> {
    let announcement = AnnouncementService::publish(&state.db, id, &auth_user).await?;
    Ok(Json(announcement))
}

#[instrument(skip(state))]
pub async fn archive_announcement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Announcement>, AppError> {
    let announcement = AnnouncementService::archive(&state.db, id, &auth_user).await?;
    Ok(Json(announcement))
}
