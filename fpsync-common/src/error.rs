//! Common error types for fpsync

use thiserror::Error;

/// Common result type for fpsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the coordinator, the stores and the gateway
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or wrong credential
    #[error("Unauthorized")]
    Unauthorized,

    /// Malformed request or rejected id batch
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Storage failure not originating in sqlx (e.g. in-memory store faults)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors raised by the datastore layer
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Storage(_))
    }
}
