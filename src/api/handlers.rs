//! API Handlers
//!
//! HTTP request handlers for each clipipe endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::config::Config;
use crate::error::{Result, StorageError};
use crate::models::{HealthResponse, StoreResponse};
use crate::storage::{build_backend, is_valid_code, StorageBackend};

/// Application state shared across all handlers.
///
/// Holds the storage backend behind an `Arc<dyn StorageBackend>`; backends
/// synchronise internally, so handlers never serialise on a global lock.
#[derive(Clone)]
pub struct AppState {
    /// Selected storage backend
    pub backend: Arc<dyn StorageBackend>,
}

impl AppState {
    /// Creates a new AppState around an existing backend.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Creates a new AppState from configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(build_backend(config).await?))
    }
}

/// Handler for POST /store
///
/// Stores the raw request body and returns the allocated code.
pub async fn store_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StoreResponse>> {
    if body.is_empty() {
        return Err(StorageError::EmptyPayload);
    }

    let size = body.len();
    let code = state.backend.store(body).await?;
    info!("Stored {} bytes under code {}", size, code);

    Ok(Json(StoreResponse::new(
        code,
        state.backend.entry_lifetime(),
    )))
}

/// Handler for GET /retrieve/:code
///
/// Returns the stored payload as `application/octet-stream`.
pub async fn retrieve_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response> {
    if !is_valid_code(&code) {
        return Err(StorageError::NotFound);
    }

    let payload = state.backend.retrieve(&code).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        payload,
    )
        .into_response())
}

/// Handler for DELETE /retrieve/:code
///
/// Removes a code. Unknown codes are not an error.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<StatusCode> {
    if is_valid_code(&code) {
        state.backend.delete(&code).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /health
///
/// Reports whether the storage substrate is reachable.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let healthy = state.backend.health().await;
    Json(HealthResponse::new(state.backend.name(), healthy))
}
