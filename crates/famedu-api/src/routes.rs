//! Route table

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{auth, families, health, users};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Auth
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/refresh", post(auth::refresh_token))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        // Users
        .route("/api/v1/users", get(users::list_users).post(users::create_user))
        .route("/api/v1/users/{id}", get(users::get_user).patch(users::update_user))
        .route("/api/v1/users/{id}/reset-password", post(users::reset_password))
        .route("/api/v1/users/{id}/status", post(users::set_status))
        // Families
        .route(
            "/api/v1/families",
            get(families::list_families).post(families::create_family),
        )
        .route("/api/v1/families/{id}", get(families::get_family))
        .with_state(state)
}
