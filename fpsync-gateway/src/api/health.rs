//! Health check endpoint

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub database: String,
}

/// GET /health
///
/// No authentication. 200 when the datastore answers a ping, 503 otherwise.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store = state.coordinator.store();

    let (status, health, database) = match store.ping().await {
        Ok(()) => (StatusCode::OK, "ok", "up"),
        Err(e) => {
            warn!(backend = store.backend(), "Health check ping failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "down")
        }
    };

    let body = HealthResponse {
        status: health.to_string(),
        module: "fpsync-gateway".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    };

    (status, Json(body))
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
