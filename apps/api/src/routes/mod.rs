pub mod health;

use axum::{
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;

use crate::sessions::handlers;
use crate::state::AppState;

/// Success envelope shared by all API responses: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn json(data: T) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            data,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/sessions",
            get(handlers::handle_list_for_user).post(handlers::handle_create),
        )
        .route("/api/v1/sessions/upcoming", get(handlers::handle_upcoming))
        .route("/api/v1/sessions/public", get(handlers::handle_public))
        .route("/api/v1/sessions/search", get(handlers::handle_search))
        .route("/api/v1/sessions/matches", get(handlers::handle_matches))
        .route("/api/v1/sessions/stats", get(handlers::handle_stats))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get)
                .patch(handlers::handle_update)
                .delete(handlers::handle_delete),
        )
        .route(
            "/api/v1/sessions/:id/participants",
            post(handlers::handle_add_participant),
        )
        .route(
            "/api/v1/sessions/:id/participants/:user_id",
            delete(handlers::handle_remove_participant),
        )
        .route(
            "/api/v1/exchange-sessions/stats",
            get(handlers::handle_exchange_stats),
        )
        .with_state(state)
}
