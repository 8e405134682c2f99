use axum::{Router, routing::get};

use super::controller::{
    create_grade, delete_grade, get_grade, list_grades, student_report, update_grade,
};
use crate::state::AppState;

pub fn init_grades_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_grades).post(create_grade))
        .route("/students/{student_id}/report", get(student_report))
        .route("/{id}", get(get_grade).put(update_grade).delete(delete_grade))
}
