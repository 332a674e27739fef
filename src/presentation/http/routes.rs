//! Route Configuration

use std::path::Path;

use axum::{response::IntoResponse, routing::get, Router};
use tower_http::services::ServeDir;

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    let static_dir = state.settings.server.static_dir.clone();

    let router = Router::new()
        // Chat endpoint, with and without trailing slash
        .route("/chat", get(ws_handler))
        .route("/chat/", get(ws_handler))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    // Browser client, if one is deployed next to the binary
    match static_dir {
        Some(dir) if Path::new(&dir).is_dir() => {
            tracing::info!(dir = %dir, "Serving static files");
            router.fallback_service(ServeDir::new(dir))
        }
        _ => router,
    }
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}
