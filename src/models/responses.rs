//! Response DTOs for the clipipe API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

/// Response body for the store operation (POST /store)
#[derive(Debug, Clone, Serialize)]
pub struct StoreResponse {
    /// Code to hand to whoever should retrieve the payload
    pub code: String,
    /// Seconds until the code expires
    pub expires_in: u64,
}

impl StoreResponse {
    /// Creates a new StoreResponse
    pub fn new(code: impl Into<String>, expires_in: u64) -> Self {
        Self {
            code: code.into(),
            expires_in,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    /// Name of the storage backend in use
    pub backend: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a HealthResponse for `backend` with current timestamp
    pub fn new(backend: impl Into<String>, healthy: bool) -> Self {
        let status = if healthy { "healthy" } else { "unhealthy" };
        Self {
            status: status.to_string(),
            backend: backend.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
