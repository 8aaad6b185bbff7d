// GET/POST handlers: version, health state, history, refresh, banner dismissal

use axum::{Json, extract::State, response::IntoResponse};

use super::AppState;
use crate::version::{NAME, VERSION};

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/health: full current state.
pub(super) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.state())
}

/// GET /api/health/history: snapshots, newest first.
pub(super) async fn history_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.snapshot_history())
}

/// POST /api/health/refresh: one cycle now; responds with the resulting state.
pub(super) async fn refresh_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.manual_refresh().await)
}

/// POST /api/health/banner/dismiss
pub(super) async fn dismiss_banner_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.store.dismiss_banner();
    Json(state.store.state())
}
