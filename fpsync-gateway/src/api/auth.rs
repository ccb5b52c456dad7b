//! API key middleware
//!
//! Applied to protected routes only; `/health` is open.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use fpsync_common::api::API_KEY_HEADER;

use crate::error::ApiError;
use crate::AppState;

/// Reject the request with 401 unless `x-api-key` matches the configured key.
///
/// Runs before the handler extracts the body, so a rejected request never
/// reaches the datastore.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    state.guard.check(presented)?;

    Ok(next.run(request).await)
}
