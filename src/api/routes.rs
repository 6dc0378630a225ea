//! API Routes
//!
//! Configures the Axum router with all clipipe endpoints.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{delete_handler, health_handler, retrieve_handler, store_handler, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /store` - Store the request body, returns a code
/// - `GET /retrieve/:code` - Retrieve a payload by code
/// - `DELETE /retrieve/:code` - Delete a code
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin, method and header
/// - Body limit: Rejects request bodies above `max_payload_bytes`
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState, max_payload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/store", post(store_handler))
        .route(
            "/retrieve/:code",
            get(retrieve_handler).delete(delete_handler),
        )
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(max_payload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
