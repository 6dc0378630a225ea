//! Memory Backend Module
//!
//! In-process storage: a HashMap of entries behind an async RwLock, with
//! lazy expiration on access.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::trace;

use crate::error::{Result, StorageError};
use crate::storage::{Entry, StorageBackend};

// == Memory Backend ==
/// Storage backend keeping every entry in process memory.
#[derive(Debug)]
pub struct MemoryBackend {
    /// Code -> entry storage
    entries: RwLock<HashMap<String, Entry>>,
    /// Lifetime in seconds applied to new entries
    lifetime_secs: u64,
}

impl MemoryBackend {
    // == Constructor ==
    /// Creates an empty backend whose entries live for `lifetime_secs`.
    pub fn new(lifetime_secs: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            lifetime_secs,
        }
    }

    // == Length ==
    /// Returns the number of physically present entries, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    // == Is Empty ==
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Removes `code` if it is present and expired. Returns true if removed.
    async fn purge_if_expired(&self, code: &str) -> bool {
        let mut entries = self.entries.write().await;
        // Re-check under the write lock, a concurrent claim may have replaced it
        if entries.get(code).is_some_and(Entry::is_expired) {
            entries.remove(code);
            trace!("Purged expired entry {}", code);
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn entry_lifetime(&self) -> u64 {
        self.lifetime_secs
    }

    async fn exists(&self, code: &str) -> Result<bool> {
        let expired = match self.entries.read().await.get(code) {
            Some(entry) => entry.is_expired(),
            None => return Ok(false),
        };
        if expired {
            self.purge_if_expired(code).await;
            return Ok(false);
        }
        Ok(true)
    }

    async fn claim(&self, code: &str, payload: &Bytes) -> Result<bool> {
        let mut entries = self.entries.write().await;
        if entries.get(code).is_some_and(|entry| !entry.is_expired()) {
            return Ok(false);
        }
        entries.insert(
            code.to_string(),
            Entry::new(payload.clone(), self.lifetime_secs),
        );
        Ok(true)
    }

    async fn retrieve(&self, code: &str) -> Result<Bytes> {
        let payload = match self.entries.read().await.get(code) {
            Some(entry) if !entry.is_expired() => Some(entry.payload.clone()),
            Some(_) => None,
            None => return Err(StorageError::NotFound),
        };
        match payload {
            Some(payload) => Ok(payload),
            None => {
                self.purge_if_expired(code).await;
                Err(StorageError::NotFound)
            }
        }
    }

    async fn delete(&self, code: &str) -> Result<()> {
        if self.entries.write().await.remove(code).is_some() {
            trace!("Deleted entry {}", code);
        }
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        Ok(before - entries.len())
    }
}
