//! Shared error types
//!
//! `ApiaryError` covers infrastructure failures (storage, transport, config).
//! Economy-rule rejections are a separate structured type in
//! [`crate::economy`] so the transport layer can map them to 4xx responses
//! while storage failures stay 5xx and retryable.

use thiserror::Error;

/// Infrastructure error for apiary services
#[derive(Error, Debug)]
pub enum ApiaryError {
    /// MongoDB or in-memory store failure
    #[error("Database error: {0}")]
    Database(String),

    /// HTTP transport failure (bad body, oversized payload)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Email provider failure
    #[error("Notification error: {0}")]
    Notify(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catch-all internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for ApiaryError {
    fn from(e: std::io::Error) -> Self {
        ApiaryError::Internal(e.to_string())
    }
}

/// Result alias using [`ApiaryError`]
pub type Result<T> = std::result::Result<T, ApiaryError>;
