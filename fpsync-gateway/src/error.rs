//! HTTP error type for fpsync-gateway
//!
//! Every error renders as the shared envelope `{"code": .., "message": ..}`.
//! Storage failures are logged in full and reported to the client as a bare
//! "Database error".

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fpsync_common::api::ApiResponse;
use thiserror::Error;
use tracing::{error, warn};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or wrong API key (401)
    #[error("Unauthorized")]
    Unauthorized,

    /// Malformed body or rejected id batch (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// No route (404)
    #[error("Not found")]
    NotFound,

    /// Body over the configured cap (413)
    #[error("Payload too large")]
    PayloadTooLarge,

    /// Datastore failure (500)
    #[error("Database error: {0}")]
    Storage(String),

    /// Anything else (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Result alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client
    fn public_message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::NotFound => "Not found".to_string(),
            ApiError::PayloadTooLarge => "Payload too large".to_string(),
            ApiError::Storage(_) => "Database error".to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<fpsync_common::Error> for ApiError {
    fn from(err: fpsync_common::Error) -> Self {
        use fpsync_common::Error;

        match err {
            Error::Unauthorized => ApiError::Unauthorized,
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Database(e) => ApiError::Storage(e.to_string()),
            Error::Storage(msg) => ApiError::Storage(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            ApiError::Storage(detail) => error!(detail = %detail, "Datastore operation failed"),
            ApiError::Internal(detail) => error!(detail = %detail, "Request failed"),
            ApiError::Unauthorized => warn!("Rejected request with missing or invalid API key"),
            _ => {}
        }

        let body = ApiResponse::<()>::error(status.as_u16(), self.public_message());
        (status, Json(body)).into_response()
    }
}
