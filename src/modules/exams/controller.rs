use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use schoolhub_core::AppError;
use schoolhub_models::auth::MessageResponse;
use schoolhub_models::exams::{
    CreateExamDto, Exam, ExamDetails, ExamFilterParams, PaginatedExamsResponse, UpdateExamDto,
};

use super::service::ExamService;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireTeacher;
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

#[instrument(skip(state, dto))]
pub async fn create_exam(
    State(state): State<AppState>,
    RequireTeacher(teacher): RequireTeacher,
    ValidatedJson(dto): ValidatedJson<CreateExamDto>,
) -> Result<(StatusCode, Json<Exam>), AppError> {
    let exam = ExamService::create_exam(&state.db, dto, teacher.user_id()?).await?;
    Ok((StatusCode::CREATED, Json(exam)))
}

#[instrument(skip(state))]
pub async fn list_exams(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    ValidatedQuery(filters): ValidatedQuery<ExamFilterParams>,
) -> Result<Json<PaginatedExamsResponse>, AppError> {
    let exams = ExamService::list_exams(&state.db, filters).await?;
    Ok(Json(exams))
}

#[instrument(skip(state))]
pub async fn get_exam(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ExamDetails>, AppError> {
    let exam = ExamService::get_exam(&state.db, id).await?;
    Ok(Json(exam))
}

#[instrument(skip(state, dto))]
pub async fn update_exam(
    State(state): State<AppState>,
    RequireTeacher(_teacher): RequireTeacher,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateExamDto>,
) -> Result<Json<Exam>, AppError> {
    let exam = ExamService::update_exam(&state.db, id, dto).await?;
    Ok(Json(exam))
}

#[instrument(skip(state))]
pub async fn delete_exam(
    State(state): State<AppState>,
    RequireTeacher(_teacher): RequireTeacher,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ExamService::delete_exam(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Exam deleted successfully")))
}
