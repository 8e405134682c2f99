use axum::{
    Router,
    routing::{delete, get, post},
};

use super::controller::{
    add_student, create_class, delete_class, get_class, list_classes, remove_student,
    update_class,
};
use crate::state::AppState;

pub fn init_classes_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_classes).post(create_class))
        .route("/{id}", get(get_class).put(update_class).delete(delete_class))
        .route("/{id}/students", post(add_student))
        .route("/{id}/students/{student_id}", delete(remove_student))
}
