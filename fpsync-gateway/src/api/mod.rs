//! HTTP API handlers for fpsync-gateway

pub mod auth;
pub mod health;
pub mod records;

pub use auth::auth_middleware;
pub use health::health_routes;
pub use records::{acknowledge_records, fetch_records};

use crate::error::ApiError;

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
