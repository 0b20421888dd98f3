//! Error types for the coordination layer
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache, queue and diagnostics API.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The injected producer returned an error
    #[error("Producer failed: {0}")]
    Producer(anyhow::Error),

    /// The producer did not settle before its deadline
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The queue entry was removed before it started
    #[error("Request cancelled: {0}")]
    Cancelled(String),

    /// The producer panicked while running on the queue
    #[error("Producer panicked: {0}")]
    Panicked(String),

    /// A value could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key not present
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CacheError::Cancelled(_) => StatusCode::CONFLICT,
            CacheError::Producer(_)
            | CacheError::Panicked(_)
            | CacheError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the coordination layer.
pub type Result<T> = std::result::Result<T, CacheError>;
