//! Expiry Sweep Task
//!
//! Background task that periodically purges expired entries. Lazy
//! expiration already hides them from callers; the sweep only reclaims
//! space held by codes nobody asks for again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::storage::StorageBackend;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. Sweep failures are logged and the loop carries on.
///
/// # Arguments
/// * `backend` - Shared storage backend
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new(3600));
/// let cleanup_handle = spawn_cleanup_task(backend.clone(), 60);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(
    backend: Arc<dyn StorageBackend>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep for {} backend every {} seconds",
            backend.name(),
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            match backend.cleanup_expired().await {
                Ok(removed) if removed > 0 => {
                    info!("Expiry sweep: removed {} expired entries", removed)
                }
                Ok(_) => debug!("Expiry sweep: no expired entries found"),
                Err(e) => warn!("Expiry sweep failed: {}", e),
            }
        }
    })
}
