use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use schoolhub_core::AppError;
use schoolhub_models::auth::MessageResponse;
use schoolhub_models::classes::{
    Class, ClassDetails, ClassFilterParams, ClassStudentDto, CreateClassDto,
    PaginatedClassesResponse, UpdateClassDto,
};

use super::service::ClassService;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

#[instrument(skip(state, dto))]
pub async fn create_class(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateClassDto>,
) -> Result<(StatusCode, Json<Class>), AppError> {
    let class = ClassService::create_class(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

#[instrument(skip(state))]
pub async fn list_classes(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    ValidatedQuery(filters): ValidatedQuery<ClassFilterParams>,
) -> Result<Json<PaginatedClassesResponse>, AppError> {
    let classes = ClassService::list_classes(&state.db, filters).await?;
    Ok(Json(classes))
}

#[instrument(skip(state))]
pub async fn get_class(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ClassDetails>, AppError> {
    let class = ClassService::get_class(&state.db, id).await?;
    Ok(Json(class))
}

#[instrument(skip(state, dto))]
pub async fn update_class(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateClassDto>,
) -> Result<Json<Class>, AppError> {
    let class = ClassService::update_class(&state.db, id, dto).await?;
    Ok(Json(class))
}

#[instrument(skip(state))]
pub async fn delete_class(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ClassService::delete_class(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Class deleted successfully")))
}

#[instrument(skip(state))]
pub async fn add_student(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<ClassStudentDto>,
) -> Result<Json<ClassDetails>, AppError> {
    let class = ClassService::add_student(&state.db, id, dto.student_id).await?;
    Ok(Json(class))
}

#[instrument(skip(state))]
pub async fn remove_student(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ClassDetails>, AppError> {
    let class = ClassService::remove_student(&state.db, id, student_id).await?;
    Ok(Json(class))
}
