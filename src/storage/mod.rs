//! Storage Module
//!
//! The code -> payload store behind the HTTP API, with three interchangeable
//! backends sharing one contract:
//!
//! - [`RedisBackend`] - shared Redis instance, expiry delegated to native TTLs
//! - [`DiskBackend`] - local directory, one `.dat` and one `.exp` file per code
//! - [`MemoryBackend`] - in-process map with lazy expiration

mod code;
mod disk;
mod entry;
mod memory;
mod redis_cache;


use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::{BackendKind, Config};
use crate::error::{Result, StorageError};

// Re-export public types
pub use code::{generate_code, is_valid_code, CODE_LENGTH};
pub use disk::DiskBackend;
pub use entry::Entry;
pub use memory::MemoryBackend;
pub use redis_cache::{RedisBackend, KEY_PREFIX};

// == Public Constants ==
/// Number of candidate codes tried before a store gives up
pub const MAX_CODE_ATTEMPTS: usize = 100;

// == Storage Backend ==
/// Contract shared by every storage substrate.
///
/// Implementors provide the `exists`/`claim` primitives; [`store`](Self::store)
/// runs the uniqueness protocol on top of them.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short backend name for logs and the health endpoint
    fn name(&self) -> &'static str;

    /// Lifetime applied to every entry, in seconds
    fn entry_lifetime(&self) -> u64;

    /// Reports whether a live entry holds `code`.
    ///
    /// An expired entry does not count and is purged as a side effect.
    async fn exists(&self, code: &str) -> Result<bool>;

    /// Writes `payload` under `code` unless the code is already taken.
    ///
    /// Returns `false` when another writer got there first.
    async fn claim(&self, code: &str, payload: &Bytes) -> Result<bool>;

    /// Returns a copy of the payload stored under a live `code`.
    async fn retrieve(&self, code: &str) -> Result<Bytes>;

    /// Removes every trace of `code`. Missing codes are not an error.
    async fn delete(&self, code: &str) -> Result<()>;

    /// Whether the substrate is reachable
    async fn health(&self) -> bool {
        true
    }

    /// Purges expired entries ahead of their next access.
    ///
    /// Returns the number of entries removed.
    async fn cleanup_expired(&self) -> Result<usize> {
        Ok(0)
    }

    /// Draws a candidate code
    fn generate_code(&self) -> String {
        generate_code()
    }

    // == Store ==
    /// Stores `payload` under a freshly allocated code and returns the code.
    async fn store(&self, payload: Bytes) -> Result<String> {
        if payload.is_empty() {
            return Err(StorageError::EmptyPayload);
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = self.generate_code();
            if self.exists(&code).await? {
                debug!("Code {} already in use (attempt {})", code, attempt);
                continue;
            }
            if self.claim(&code, &payload).await? {
                debug!(
                    "Stored {} bytes under {} via {} backend",
                    payload.len(),
                    code,
                    self.name()
                );
                return Ok(code);
            }
            debug!("Lost race for code {} (attempt {})", code, attempt);
        }

        error!(
            "{} backend exhausted {} code allocation attempts",
            self.name(),
            MAX_CODE_ATTEMPTS
        );
        Err(StorageError::AllocationExhausted {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }
}

// == Backend Factory ==
/// Builds the backend selected by `config`.
pub async fn build_backend(config: &Config) -> Result<Arc<dyn StorageBackend>> {
    let backend: Arc<dyn StorageBackend> = match config.backend {
        BackendKind::Redis => Arc::new(RedisBackend::new(
            &config.redis_url,
            config.timeout_seconds,
        )?),
        BackendKind::Disk => Arc::new(
            DiskBackend::open(config.storage_path.clone(), config.timeout_seconds).await?,
        ),
        BackendKind::Memory => Arc::new(MemoryBackend::new(config.timeout_seconds)),
    };
    info!(
        "Using {} storage backend, entry lifetime {}s",
        backend.name(),
        backend.entry_lifetime()
    );
    Ok(backend)
}
