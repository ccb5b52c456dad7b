//! Shared API request/response types
//!
//! Every response, success or error, uses the same envelope:
//! a numeric `code`, a short `message` and, for fetch, a `data` array.

use serde::{Deserialize, Serialize};

// ========================================
// Response Envelope
// ========================================

/// Response envelope returned by every endpoint
///
/// # Examples
///
/// ```
/// use fpsync_common::api::types::ApiResponse;
///
/// let ok: ApiResponse<()> = ApiResponse::ok();
/// let json = serde_json::to_string(&ok).unwrap();
/// assert_eq!(json, r#"{"code":200,"message":"success"}"#);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Numeric status (mirrors the HTTP status)
    pub code: u16,
    /// Human-readable message
    pub message: String,
    /// Payload, present on fetch only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying data
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    /// Successful response without data
    pub fn ok() -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data: None,
        }
    }

    /// Error response
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

// ========================================
// Acknowledge Request
// ========================================

/// Body of `POST /update`
///
/// Accepts `{"ids": [1, 2]}` and the legacy bare array `[1, 2]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AckRequest {
    /// `{"ids": [...]}`
    Envelope { ids: Vec<i64> },
    /// `[...]`
    Bare(Vec<i64>),
}

impl AckRequest {
    /// Requested record ids, in request order
    pub fn into_ids(self) -> Vec<i64> {
        match self {
            AckRequest::Envelope { ids } => ids,
            AckRequest::Bare(ids) => ids,
        }
    }
}
