use axum::{
    Router,
    routing::{delete, get, post},
};

use super::controller::{
    add_subject, create_enrollment, delete_enrollment, get_enrollment, list_enrollments,
    remove_subject, update_enrollment,
};
use crate::state::AppState;

pub fn init_enrollments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_enrollments).post(create_enrollment))
        .route(
            "/{id}",
            get(get_enrollment)
                .put(update_enrollment)
                .delete(delete_enrollment),
        )
        .route("/{id}/subjects", post(add_subject))
        .route("/{id}/subjects/{subject_id}", delete(remove_subject))
}
