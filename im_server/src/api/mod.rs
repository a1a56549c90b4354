//! REST API for the matchmaking server.

pub mod games;
pub mod matches;
pub mod request_id;

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use island_match::MatchManager;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<MatchManager>,
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let root_routes = Router::new().route("/health", get(health_check));

    let v1_routes = Router::new()
        .route("/matches", get(matches::list_matches))
        .route("/matches/{match_id}/signup", post(matches::signup))
        .route("/matches/{match_id}/continue", post(matches::continue_match))
        .route("/matches/{match_id}/exit", post(matches::exit_match))
        .route("/matches/{match_id}/net-state", post(games::net_state))
        .route(
            "/matches/{match_id}/tables/{table_id}/result",
            post(games::game_result),
        )
        .route(
            "/matches/{match_id}/tables/{table_id}/over",
            post(games::game_over),
        );

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl IntoResponse {
    let (status, status_code) = if state.manager.is_empty() {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    } else {
        ("healthy", StatusCode::OK)
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "matches": state.manager.len(),
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
