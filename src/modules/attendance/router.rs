use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{
    bulk_mark, delete_attendance, get_attendance, list_attendance, mark_attendance,
    student_summary, update_attendance,
};
use crate::state::AppState;

pub fn init_attendance_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_attendance).post(mark_attendance))
        .route("/bulk", post(bulk_mark))
        .route("/students/{student_id}/summary", get(student_summary))
        .route(
            "/{id}",
            get(get_attendance)
                .put(update_attendance)
                .delete(delete_attendance),
        )
}
