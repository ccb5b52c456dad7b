//! API module for shared HTTP API functionality
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Shared request/response types
//!
//! The gateway wraps these with axum middleware and handlers.

pub mod auth;
pub mod types;

pub use auth::{AccessGuard, API_KEY_HEADER};
pub use types::{AckRequest, ApiResponse};
