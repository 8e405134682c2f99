use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use schoolhub_core::AppError;
use schoolhub_models::attendance::{
    Attendance, AttendanceDetails, AttendanceFilterParams, AttendanceSummary,
    AttendanceSummaryParams, BulkAttendanceDto, MarkAttendanceDto, PaginatedAttendanceResponse,
    UpdateAttendanceDto,
};
use schoolhub_models::auth::MessageResponse;

use super::service::AttendanceService;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireTeacher;
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

#[instrument(skip(state, dto))]
pub async fn mark_attendance(
    State(state): State<AppState>,
    RequireTeacher(teacher): RequireTeacher,
    ValidatedJson(dto): ValidatedJson<MarkAttendanceDto>,
) -> Result<(StatusCode, Json<Attendance>), AppError> {
    let record = AttendanceService::mark_attendance(&state.db, dto, teacher.user_id()?).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[instrument(skip(state, dto))]
pub async fn bulk_mark(
    State(state): State<AppState>,
    RequireTeacher(teacher): RequireTeacher,
    ValidatedJson(dto): ValidatedJson<BulkAttendanceDto>,
) -> Result<Json<Vec<Attendance>>, AppError> {
    let records = AttendanceService::bulk_mark(&state.db, dto, teacher.user_id()?).await?;
    Ok(Json(records))
}

#[instrument(skip(state))]
pub async fn list_attendance(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    ValidatedQuery(filters): ValidatedQuery<AttendanceFilterParams>,
) -> Result<Json<PaginatedAttendanceResponse>, AppError> {
    let records = AttendanceService::list_attendance(&state.db, filters).await?;
    Ok(Json(records))
}

#[instrument(skip(state))]
pub async fn get_attendance(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AttendanceDetails>, AppError> {
    let record = AttendanceService::get_attendance(&state.db, id).await?;
    Ok(Json(record))
}

#[instrument(skip(state, dto))]
pub async fn update_attendance(
    State(state): State<AppState>,
    RequireTeacher(teacher): RequireTeacher,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateAttendanceDto>,
) -> Result<Json<Attendance>, AppError> {
    let record =
        AttendanceService::update_attendance(&state.db, id, dto, teacher.user_id()?).await?;
    Ok(Json(record))
}

#[instrument(skip(state))]
pub async fn delete_attendance(
    State(state): State<AppState>,
    RequireTeacher(_teacher): RequireTeacher,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    AttendanceService::delete_attendance(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Attendance record deleted successfully")))
}

#[instrument(skip(state))]
pub async fn student_summary(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(student_id): Path<Uuid>,
    ValidatedQuery(params): ValidatedQuery<AttendanceSummaryParams>,
) -> Result<Json<AttendanceSummary>, AppError> {
    let summary = AttendanceService::student_summary(&state.db, student_id, params).await?;
    Ok(Json(summary))
}
