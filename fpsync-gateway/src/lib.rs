//! fpsync-gateway library
//!
//! HTTP surface over the fetch/acknowledge coordinator: `GET /fetch` and
//! `POST /update` behind the API key, `GET /health` open.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use fpsync_common::config::{DEFAULT_MAX_BODY_BYTES, DEFAULT_REQUEST_TIMEOUT_SECS};
use fpsync_common::{AccessGuard, GatewayConfig, RecordStore, SyncCoordinator};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub mod api;
pub mod cli;
pub mod error;
pub mod middleware;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Fetch/acknowledge coordinator over the injected store
    pub coordinator: Arc<SyncCoordinator>,
    /// API key check
    pub guard: Arc<AccessGuard>,
    /// Whole-request timeout
    pub request_timeout: Duration,
    /// Request body cap in bytes
    pub max_body_bytes: usize,
}

impl AppState {
    /// Create state with the default timeout and body cap
    pub fn new(coordinator: SyncCoordinator, guard: AccessGuard) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            guard: Arc::new(guard),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Create state for a connected store from validated configuration
    pub fn from_config(
        store: Arc<dyn RecordStore>,
        config: &GatewayConfig,
    ) -> fpsync_common::Result<Self> {
        let coordinator =
            SyncCoordinator::new(store).with_limits(config.fetch_limit, config.max_ack_ids);
        let guard = AccessGuard::new(config.api_key.clone())?;

        Ok(Self {
            coordinator: Arc::new(coordinator),
            guard: Arc::new(guard),
            request_timeout: config.request_timeout,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

/// Build application router
///
/// Auth is attached with `route_layer`, so it runs only for matched
/// protected routes and before their body is read.
pub fn build_router(state: AppState) -> Router {
    // Protected routes (require API key)
    let protected = Router::new()
        .route("/fetch", get(api::fetch_records))
        .route("/update", post(api::acknowledge_records))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    Router::new()
        .merge(protected)
        .merge(api::health_routes())
        .fallback(api::not_found)
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(TimeoutLayer::new(state.request_timeout))
        .layer(TraceLayer::new_for_http().make_span_with(middleware::make_request_span))
        .layer(axum::middleware::from_fn(middleware::request_id))
        .with_state(state)
}
