//! API Module
//!
//! HTTP handlers and routing for the clipipe REST API.
//!
//! # Endpoints
//! - `POST /store` - Store the request body, returns a code
//! - `GET /retrieve/:code` - Retrieve a payload by code
//! - `DELETE /retrieve/:code` - Delete a code
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
