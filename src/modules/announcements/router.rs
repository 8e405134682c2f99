use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{
    archive_announcement, create_announcement, delete_announcement, get_announcement,
    list_announcements, publish_announcement, update_announcement,
};
use crate::state::AppState;

pub fn init_announcements_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_announcements).post(create_announcement))
        .route(
            "/{id}",
            get(get_announcement)
                .put(update_announcement)
                .delete(delete_announcement),
        )
        .route("/{id}/publish", post(publish_announcement))
        .route("/{id}/archive", post(archive_announcement))
}
