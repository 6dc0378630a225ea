//! Clipipe - Temporary data storage with human-readable codes
//!
//! Accepts an opaque payload, hands back a pronounceable code such as
//! `bakodu42`, and serves the payload to whoever presents the code until it
//! expires. Payloads live in Redis, on local disk, or in memory.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use storage::StorageBackend;
pub use tasks::spawn_cleanup_task;
