//! Error types for the clipipe server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

// == Storage Error Enum ==
/// Unified error type for the storage core and the HTTP boundary.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Caller supplied no bytes to store
    #[error("No data provided")]
    EmptyPayload,

    /// The uniqueness protocol ran out of attempts
    #[error("Unable to generate unique code after {attempts} attempts")]
    AllocationExhausted { attempts: usize },

    /// Code never existed, expired, or was deleted
    #[error("Code not found or expired")]
    NotFound,

    /// Storage substrate unreachable or I/O failure
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Half-written or unreadable entry (filesystem backend)
    #[error("Corrupt entry: {0}")]
    CorruptEntry(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::BackendUnavailable(format!("I/O error: {}", err))
    }
}

impl From<redis::RedisError> for StorageError {
    fn from(err: redis::RedisError) -> Self {
        StorageError::BackendUnavailable(format!("Redis error: {}", err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for StorageError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            StorageError::EmptyPayload => (StatusCode::BAD_REQUEST, self.to_string()),
            StorageError::NotFound | StorageError::CorruptEntry(_) => (
                StatusCode::NOT_FOUND,
                StorageError::NotFound.to_string(),
            ),
            StorageError::AllocationExhausted { .. } => {
                error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Unable to generate unique code".to_string(),
                )
            }
            StorageError::BackendUnavailable(detail) => {
                error!("Storage backend failure: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(message));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the storage core.
pub type Result<T> = std::result::Result<T, StorageError>;
