use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use schoolhub_core::AppError;
use schoolhub_models::auth::MessageResponse;
use schoolhub_models::grades::{
    CreateGradeDto, Grade, GradeDetails, GradeFilterParams, PaginatedGradesResponse,
    StudentGradeReport, UpdateGradeDto,
};

use super::service::GradeService;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireTeacher;
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

#[instrument(skip(state, dto))]
pub async fn create_grade(
    State(state): State<AppState>,
    RequireTeacher(teacher): RequireTeacher,
    ValidatedJson(dto): ValidatedJson<CreateGradeDto>,
) -> Result<(StatusCode, Json<Grade>), AppError> {
    let grade = GradeService::create_grade(&state.db, dto, teacher.user_id()?).await?;
    Ok((StatusCode::CREATED, Json(grade)))
}

#[instrument(skip(state))]
pub async fn list_grades(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    ValidatedQuery(filters): ValidatedQuery<GradeFilterParams>,
) -> Result<Json<PaginatedGradesResponse>, AppError> {
    let grades = GradeService::list_grades(&state.db, filters).await?;
    Ok(Json(grades))
}

#[instrument(skip(state))]
pub async fn get_grade(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<GradeDetails>, AppError> {
    let grade = GradeService::get_grade(&state.db, id).await?;
    Ok(Json(grade))
}

#[instrument(skip(state, dto))]
pub async fn update_grade(
    State(state): State<AppState>,
    RequireTeacher(teacher): RequireTeacher,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateGradeDto>,
) -> Result<Json<Grade>, AppError> {
    let grade = GradeService::update_grade(&state.db, id, dto, teacher.user_id()?).await?;
    Ok(Json(grade))
}

#[instrument(skip(state))]
pub async fn delete_grade(
    State(state): State<AppState>,
    RequireTeacher(_teacher): RequireTeacher,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    GradeService::delete_grade(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Grade deleted successfully")))
}

#[instrument(skip(state))]
pub async fn student_report(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(student_id): Path<Uuid>,
) -> Result<Json<StudentGradeReport>, AppError> {
    let report = GradeService::student_report(&state.db, student_id).await?;
    Ok(Json(report))
}
