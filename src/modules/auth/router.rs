use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{
    change_password, forgot_password, login, logout, me, refresh, register, reset_password,
    update_profile,
};
use crate::state::AppState;

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/change-password", post(change_password))
        .route("/me", get(me).put(update_profile))
}
