//! Response models for the clipipe API
//!
//! This module defines the DTOs (Data Transfer Objects) serialized into
//! HTTP response bodies. Request bodies are raw bytes and need no model.

pub mod responses;

// Re-export commonly used types
pub use responses::{ErrorResponse, HealthResponse, StoreResponse};
