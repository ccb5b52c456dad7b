//! Fetch and acknowledge endpoints

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    Json,
};
use fpsync_common::api::{AckRequest, ApiResponse};
use fpsync_common::FingerprintLog;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /fetch
///
/// Pending records, oldest first, up to the configured limit. Nothing is
/// marked.
pub async fn fetch_records(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<FingerprintLog>>>> {
    let records = state.coordinator.fetch().await?;
    Ok(Json(ApiResponse::success(records)))
}

/// POST /update
///
/// Body `{"ids": [..]}` (or a bare `[..]`). Marks the listed records fetched
/// in one transaction. Ids that are unknown or already fetched are ignored.
pub async fn acknowledge_records(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    })?;

    let request: AckRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!("Rejected acknowledge body: {}", e);
        ApiError::BadRequest("Invalid request body, expected {\"ids\": [int, ...]}".to_string())
    })?;

    state.coordinator.acknowledge(request.into_ids()).await?;

    Ok(Json(ApiResponse::ok()))
}
