//! Disk Backend Module
//!
//! Each code owns two files under the storage root:
//!
//! - `<code>.dat` - raw payload bytes
//! - `<code>.exp` - RFC 3339 expiration instant
//!
//! An entry is live only when both files exist, the expiry parses and lies
//! in the future. The data file is written first, so a missing expiry means
//! either a store in flight or a crash mid-store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace, warn};

use crate::error::{Result, StorageError};
use crate::storage::entry::{expiry_from_now, format_expiry, is_past, parse_expiry};
use crate::storage::{is_valid_code, StorageBackend};

const DATA_FILE_EXT: &str = "dat";
const EXPIRATION_FILE_EXT: &str = "exp";
const TEMP_FILE_EXT: &str = "tmp";

/// Outcome of reading an expiry record.
enum ExpiryState {
    Live,
    Missing,
    Expired,
    Corrupt(String),
}

// == Disk Backend ==
/// Storage backend keeping entries as file pairs in a local directory.
#[derive(Debug, Clone)]
pub struct DiskBackend {
    root: PathBuf,
    lifetime_secs: u64,
}

impl DiskBackend {
    // == Constructor ==
    /// Opens (and creates if needed) the storage directory at `root`.
    pub async fn open(root: impl Into<PathBuf>, lifetime_secs: u64) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        debug!("Disk storage rooted at {}", root.display());
        Ok(Self {
            root,
            lifetime_secs,
        })
    }

    /// Path of the payload record for `code`
    pub fn data_file(&self, code: &str) -> PathBuf {
        self.root.join(format!("{}.{}", code, DATA_FILE_EXT))
    }

    /// Path of the expiry record for `code`
    pub fn expiration_file(&self, code: &str) -> PathBuf {
        self.root.join(format!("{}.{}", code, EXPIRATION_FILE_EXT))
    }

    fn temp_expiration_file(&self, code: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}.{}", code, EXPIRATION_FILE_EXT, TEMP_FILE_EXT))
    }

    async fn expiry_state(&self, code: &str) -> Result<ExpiryState> {
        let text = match fs::read_to_string(self.expiration_file(code)).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ExpiryState::Missing),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Ok(ExpiryState::Corrupt("expiry record is not UTF-8".into()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(match parse_expiry(&text) {
            Some(instant) if is_past(instant) => ExpiryState::Expired,
            Some(_) => ExpiryState::Live,
            None => ExpiryState::Corrupt(format!("unparsable expiry record {:?}", text.trim())),
        })
    }

    /// Deletes both records, logging instead of failing.
    async fn purge(&self, code: &str) {
        if let Err(e) = self.delete(code).await {
            warn!("Failed to purge entry {}: {}", code, e);
        }
    }

    /// Reads the expiry record, purging the pair when it is expired or corrupt.
    ///
    /// Returns the state observed before any purge.
    async fn check_and_purge(&self, code: &str) -> Result<ExpiryState> {
        let state = self.expiry_state(code).await?;
        match &state {
            ExpiryState::Live | ExpiryState::Missing => {}
            ExpiryState::Expired => {
                trace!("Entry {} expired, purging", code);
                self.purge(code).await;
            }
            ExpiryState::Corrupt(reason) => {
                warn!("Corrupt entry {}: {}, purging", code, reason);
                self.purge(code).await;
            }
        }
        Ok(state)
    }

    /// Runs the existence check, purging expired and corrupt pairs.
    async fn check_live(&self, code: &str) -> Result<bool> {
        Ok(matches!(
            self.check_and_purge(code).await?,
            ExpiryState::Live
        ))
    }

    /// Sweep step for one expiry record. Returns true if the pair was purged.
    async fn sweep_expiry(&self, code: &str) -> Result<bool> {
        Ok(matches!(
            self.check_and_purge(code).await?,
            ExpiryState::Expired | ExpiryState::Corrupt(_)
        ))
    }

    async fn write_expiry(&self, code: &str) -> Result<()> {
        let temp = self.temp_expiration_file(code);
        let expires_at = format_expiry(expiry_from_now(self.lifetime_secs));
        fs::write(&temp, expires_at.as_bytes()).await?;
        fs::rename(&temp, self.expiration_file(code)).await?;
        Ok(())
    }

    async fn write_records(&self, mut file: fs::File, code: &str, payload: &[u8]) -> Result<()> {
        file.write_all(payload).await?;
        file.flush().await?;
        drop(file);
        self.write_expiry(code).await
    }

    async fn is_stale(&self, path: &Path) -> bool {
        let max_age = Duration::from_secs(self.lifetime_secs);
        match fs::metadata(path).await.and_then(|meta| meta.modified()) {
            Ok(modified) => SystemTime::now()
                .duration_since(modified)
                .is_ok_and(|age| age > max_age),
            Err(_) => false,
        }
    }
}

async fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl StorageBackend for DiskBackend {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn entry_lifetime(&self) -> u64 {
        self.lifetime_secs
    }

    async fn exists(&self, code: &str) -> Result<bool> {
        // Codes become file names, anything else is never looked up
        if !is_valid_code(code) {
            return Ok(false);
        }
        self.check_live(code).await
    }

    async fn claim(&self, code: &str, payload: &Bytes) -> Result<bool> {
        if !is_valid_code(code) {
            return Ok(false);
        }
        // create_new makes a concurrent claimant of the same code lose
        let file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.data_file(code))
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = self.write_records(file, code, payload).await {
            self.purge(code).await;
            return Err(e);
        }
        Ok(true)
    }

    async fn retrieve(&self, code: &str) -> Result<Bytes> {
        if !self.exists(code).await? {
            return Err(StorageError::NotFound);
        }
        match fs::read(self.data_file(code)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Corrupt entry {}: expiry without data, purging", code);
                self.purge(code).await;
                Err(StorageError::CorruptEntry(code.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, code: &str) -> Result<()> {
        if !is_valid_code(code) {
            return Ok(());
        }
        let data = remove_if_present(&self.data_file(code)).await?;
        let expiry = remove_if_present(&self.expiration_file(code)).await?;
        if data || expiry {
            trace!("Deleted entry {}", code);
        }
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        let mut removed = 0;
        let mut dir = fs::read_dir(&self.root).await?;

        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            let (Some(code), Some(ext)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.extension().and_then(|s| s.to_str()),
            ) else {
                continue;
            };

            match ext {
                EXPIRATION_FILE_EXT if is_valid_code(code) => {
                    if self.sweep_expiry(code).await? {
                        removed += 1;
                    }
                }
                DATA_FILE_EXT if is_valid_code(code) => {
                    // Data with no expiry is only reclaimed once it is older than any live entry
                    let has_expiry = fs::try_exists(self.expiration_file(code)).await?;
                    if !has_expiry && self.is_stale(&path).await {
                        warn!("Removing orphaned data record for {}", code);
                        remove_if_present(&path).await?;
                        removed += 1;
                    }
                }
                TEMP_FILE_EXT => {
                    if self.is_stale(&path).await {
                        remove_if_present(&path).await?;
                    }
                }
                _ => {}
            }
        }

        Ok(removed)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;
    use tempfile::TempDir;

    async fn backend(lifetime_secs: u64) -> (TempDir, DiskBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = DiskBackend::open(dir.path(), lifetime_secs).await.unwrap();
        (dir, backend)
    }

    #[tokio::test]
    async fn test_store_writes_both_records() {
        let (_dir, backend) = backend(300).await;

        let code = backend.store(Bytes::from_static(b"payload")).await.unwrap();

        assert_eq!(
            std::fs::read(backend.data_file(&code)).unwrap(),
            b"payload"
        );
        let expiry = std::fs::read_to_string(backend.expiration_file(&code)).unwrap();
        assert!(parse_expiry(&expiry).is_some());
        assert!(!backend.temp_expiration_file(&code).exists());
    }

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let (_dir, backend) = backend(300).await;
        let payload = Bytes::from(vec![0u8, 159, 146, 150, 255]);

        let code = backend.store(payload.clone()).await.unwrap();

        assert_eq!(backend.retrieve(&code).await.unwrap(), payload);
    }

    #[tokio::test]
    async fn test_retrieve_nonexistent() {
        let (_dir, backend) = backend(300).await;

        assert!(matches!(
            backend.retrieve("bakodu42").await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_retrieve_rejects_path_like_codes() {
        let (dir, backend) = backend(300).await;
        std::fs::write(dir.path().join("secret.dat"), b"x").unwrap();

        assert!(matches!(
            backend.retrieve("../secret").await,
            Err(StorageError::NotFound)
        ));
        assert!(matches!(
            backend.retrieve("secret").await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_expired_entry_is_purged() {
        let (_dir, backend) = backend(1).await;
        let code = backend.store(Bytes::from_static(b"hello world")).await.unwrap();

        assert_eq!(
            backend.retrieve(&code).await.unwrap(),
            Bytes::from_static(b"hello world")
        );

        sleep(std::time::Duration::from_secs(2)).await;

        assert!(matches!(
            backend.retrieve(&code).await,
            Err(StorageError::NotFound)
        ));
        assert!(!backend.data_file(&code).exists());
        assert!(!backend.expiration_file(&code).exists());
    }

    #[tokio::test]
    async fn test_data_without_expiry_is_absent() {
        let (_dir, backend) = backend(300).await;
        std::fs::write(backend.data_file("bakodu42"), b"half written").unwrap();

        assert!(!backend.exists("bakodu42").await.unwrap());
        assert!(matches!(
            backend.retrieve("bakodu42").await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_data_without_expiry_blocks_claim() {
        let (_dir, backend) = backend(300).await;
        std::fs::write(backend.data_file("bakodu42"), b"in flight").unwrap();

        let claimed = backend
            .claim("bakodu42", &Bytes::from_static(b"other"))
            .await
            .unwrap();

        assert!(!claimed);
        assert_eq!(
            std::fs::read(backend.data_file("bakodu42")).unwrap(),
            b"in flight"
        );
    }

    #[tokio::test]
    async fn test_corrupt_expiry_is_purged() {
        let (_dir, backend) = backend(300).await;
        std::fs::write(backend.data_file("bakodu42"), b"payload").unwrap();
        std::fs::write(backend.expiration_file("bakodu42"), b"not a timestamp").unwrap();

        assert!(matches!(
            backend.retrieve("bakodu42").await,
            Err(StorageError::NotFound)
        ));
        assert!(!backend.data_file("bakodu42").exists());
        assert!(!backend.expiration_file("bakodu42").exists());
    }

    #[tokio::test]
    async fn test_expiry_without_data_is_corrupt() {
        let (_dir, backend) = backend(300).await;
        let expiry = format_expiry(expiry_from_now(300));
        std::fs::write(backend.expiration_file("bakodu42"), expiry).unwrap();

        assert!(matches!(
            backend.retrieve("bakodu42").await,
            Err(StorageError::CorruptEntry(_))
        ));
        assert!(!backend.expiration_file("bakodu42").exists());
    }

    #[tokio::test]
    async fn test_expiry_with_whitespace_parses() {
        let (_dir, backend) = backend(300).await;
        let expiry = format!("  {}\n", format_expiry(expiry_from_now(300)));
        std::fs::write(backend.data_file("bakodu42"), b"payload").unwrap();
        std::fs::write(backend.expiration_file("bakodu42"), expiry).unwrap();

        assert_eq!(
            backend.retrieve("bakodu42").await.unwrap(),
            Bytes::from_static(b"payload")
        );
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, backend) = backend(300).await;
        let code = backend.store(Bytes::from_static(b"bye")).await.unwrap();

        backend.delete(&code).await.unwrap();
        backend.delete(&code).await.unwrap();
        backend.delete("zuzuzu00").await.unwrap();

        assert!(!backend.data_file(&code).exists());
        assert!(!backend.expiration_file(&code).exists());
    }

    #[tokio::test]
    async fn test_delete_tolerates_half_entries() {
        let (_dir, backend) = backend(300).await;
        std::fs::write(backend.data_file("bakodu42"), b"payload").unwrap();

        backend.delete("bakodu42").await.unwrap();

        assert!(!backend.data_file("bakodu42").exists());
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let (_dir, backend) = backend(1).await;
        let expired = backend.store(Bytes::from_static(b"one")).await.unwrap();
        std::fs::write(backend.expiration_file("zuzuzu00"), b"garbage").unwrap();

        sleep(std::time::Duration::from_millis(1100)).await;
        let live = backend.store(Bytes::from_static(b"two")).await.unwrap();

        let removed = backend.cleanup_expired().await.unwrap();

        assert_eq!(removed, 2);
        assert!(!backend.data_file(&expired).exists());
        assert!(!backend.expiration_file("zuzuzu00").exists());
        assert!(backend.retrieve(&live).await.is_ok());
    }

    #[tokio::test]
    async fn test_claim_rejects_malformed_codes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let backend = DiskBackend::open(&root, 300).await.unwrap();

        for code in ["../escape", "nested/code", "BAKODU42", ""] {
            let claimed = backend
                .claim(code, &Bytes::from_static(b"payload"))
                .await
                .unwrap();
            assert!(!claimed, "{:?} should not be claimable", code);
        }

        assert!(!dir.path().join("escape.dat").exists());
        assert!(!dir.path().join("escape.exp").exists());
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_counts_only_purged_pairs() {
        let (_dir, backend) = backend(1).await;
        let expired = backend.store(Bytes::from_static(b"old")).await.unwrap();
        std::fs::write(backend.expiration_file("zuzuzu00"), b"garbage").unwrap();
        let live = format_expiry(expiry_from_now(300));
        std::fs::write(backend.expiration_file("bakodu42"), live).unwrap();

        sleep(std::time::Duration::from_millis(1100)).await;

        // Expiry record gone by the time the sweep reads it
        assert!(!backend.sweep_expiry("mimomu11").await.unwrap());
        assert!(!backend.sweep_expiry("bakodu42").await.unwrap());
        assert!(backend.sweep_expiry("zuzuzu00").await.unwrap());
        assert!(backend.sweep_expiry(&expired).await.unwrap());
        assert!(!backend.expiration_file(&expired).exists());
    }

    #[tokio::test]
    async fn test_cleanup_removes_stale_orphaned_data() {
        let (_dir, backend) = backend(1).await;
        std::fs::write(backend.data_file("bakodu42"), b"orphan").unwrap();

        assert_eq!(backend.cleanup_expired().await.unwrap(), 0);
        assert!(backend.data_file("bakodu42").exists());

        sleep(std::time::Duration::from_millis(2100)).await;

        assert_eq!(backend.cleanup_expired().await.unwrap(), 1);
        assert!(!backend.data_file("bakodu42").exists());
    }
}
