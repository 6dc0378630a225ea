//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: Purges expired entries before anyone asks for them again

mod cleanup;

pub use cleanup::spawn_cleanup_task;
