use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use schoolhub_core::AppError;
use schoolhub_models::auth::MessageResponse;
use schoolhub_models::enrollments::{
    CreateEnrollmentDto, Enrollment, EnrollmentDetails, EnrollmentFilterParams,
    EnrollmentSubjectDto, PaginatedEnrollmentsResponse, UpdateEnrollmentDto,
};

use super::service::EnrollmentService;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

#[instrument(skip(state, dto))]
pub async fn create_enrollment(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateEnrollmentDto>,
) -> Result<(StatusCode, Json<Enrollment>), AppError> {
    let enrollment = EnrollmentService::create_enrollment(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[instrument(skip(state))]
pub async fn list_enrollments(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    ValidatedQuery(filters): ValidatedQuery<EnrollmentFilterParams>,
) -> Result<Json<PaginatedEnrollmentsResponse>, AppError> {
    let enrollments = EnrollmentService::list_enrollments(&state.db, filters).await?;
    Ok(Json(enrollments))
}

#[instrument(skip(state))]
pub async fn get_enrollment(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EnrollmentDetails>, AppError> {
    let enrollment = EnrollmentService::get_enrollment(&state.db, id).await?;
    Ok(Json(enrollment))
}

#[instrument(skip(state, dto))]
pub async fn update_enrollment(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateEnrollmentDto>,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment = EnrollmentService::update_enrollment(&state.db, id, dto).await?;
    Ok(Json(enrollment))
}

#[instrument(skip(state))]
pub async fn delete_enrollment(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    EnrollmentService::delete_enrollment(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Enrollment deleted successfully")))
}

#[instrument(skip(state))]
pub async fn add_subject(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<EnrollmentSubjectDto>,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment = EnrollmentService::add_subject(&state.db, id, dto.subject_id).await?;
    Ok(Json(enrollment))
}

#[instrument(skip(state))]
pub async fn remove_subject(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((id, subject_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment = EnrollmentService::remove_subject(&state.db, id, subject_id).await?;
    Ok(Json(enrollment))
}
