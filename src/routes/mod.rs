// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::store::HealthStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<HealthStore>,
}

pub fn app(store: Arc<HealthStore>) -> Router {
    let state = AppState { store };
    Router::new()
        .route("/", get(|| async { "gateway-health: payment gateway health monitor" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/health", get(http::health_handler)) // GET /api/health
        .route("/api/health/history", get(http::history_handler)) // GET /api/health/history
        .route("/api/health/refresh", post(http::refresh_handler)) // POST /api/health/refresh
        .route(
            "/api/health/banner/dismiss",
            post(http::dismiss_banner_handler),
        ) // POST /api/health/banner/dismiss
        .route("/ws/health", get(ws::ws_health)) // WS /ws/health
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
