//! Redis Backend Module
//!
//! Stores each payload under `clipipe:<code>` with a native Redis TTL, so
//! expiry needs no bookkeeping on our side.

use async_trait::async_trait;
use bytes::Bytes;
use redis::{aio::MultiplexedConnection, AsyncCommands};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, trace};

use crate::error::{Result, StorageError};
use crate::storage::StorageBackend;

/// Namespace prefix of every key written by this backend
pub const KEY_PREFIX: &str = "clipipe:";

// == Redis Backend ==
/// Storage backend delegating expiry to Redis key TTLs.
pub struct RedisBackend {
    client: redis::Client,
    /// Lazily established connection, dropped after a failure
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    lifetime_secs: u64,
}

impl RedisBackend {
    /// Creates a backend for `url`. No connection is made until first use.
    pub fn new(url: &str, lifetime_secs: u64) -> Result<Self> {
        let client = redis::Client::open(url)?;
        debug!("Redis backend configured for {}", url);
        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            // SET EX rejects a zero TTL
            lifetime_secs: lifetime_secs.max(1),
        })
    }

    /// Returns the key used for `code`.
    pub fn make_key(code: &str) -> String {
        format!("{}{}", KEY_PREFIX, code)
    }

    async fn get_connection(&self) -> Result<MultiplexedConnection> {
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // Another task may have connected while we waited for the lock
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        let new_conn = self.client.get_multiplexed_async_connection().await?;
        *conn_guard = Some(new_conn.clone());
        debug!("Redis connection established");

        Ok(new_conn)
    }

    async fn reset_connection(&self) {
        let mut conn_guard = self.connection.write().await;
        *conn_guard = None;
        debug!("Redis connection reset due to error");
    }

    /// Drops the cached connection when `result` is a substrate error.
    async fn checked<T>(&self, result: redis::RedisResult<T>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                error!("Redis command failed: {}", e);
                self.reset_connection().await;
                Err(StorageError::from(e))
            }
        }
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        let conn = self.get_connection().await;
        if let Err(ref e) = conn {
            error!("Failed to get Redis connection: {}", e);
        }
        conn
    }
}

#[async_trait]
impl StorageBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    fn entry_lifetime(&self) -> u64 {
        self.lifetime_secs
    }

    async fn exists(&self, code: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let result = conn.exists::<_, bool>(Self::make_key(code)).await;
        self.checked(result).await
    }

    async fn claim(&self, code: &str, payload: &Bytes) -> Result<bool> {
        let mut conn = self.connection().await?;
        // NX turns the write into a write-if-absent, EX attaches the TTL
        let result: redis::RedisResult<redis::Value> = redis::cmd("SET")
            .arg(Self::make_key(code))
            .arg(payload.as_ref())
            .arg("NX")
            .arg("EX")
            .arg(self.lifetime_secs)
            .query_async(&mut conn)
            .await;
        let reply = self.checked(result).await?;
        Ok(!matches!(reply, redis::Value::Nil))
    }

    async fn retrieve(&self, code: &str) -> Result<Bytes> {
        let mut conn = self.connection().await?;
        let result = conn
            .get::<_, Option<Vec<u8>>>(Self::make_key(code))
            .await;
        match self.checked(result).await? {
            Some(data) => {
                trace!("Retrieved {} bytes for {}", data.len(), code);
                Ok(Bytes::from(data))
            }
            None => Err(StorageError::NotFound),
        }
    }

    async fn delete(&self, code: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let result = conn.del::<_, i64>(Self::make_key(code)).await;
        let deleted = self.checked(result).await?;
        trace!("Deleted {} key(s) for {}", deleted, code);
        Ok(())
    }

    async fn health(&self) -> bool {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(_) => return false,
        };
        let result: redis::RedisResult<String> =
            redis::cmd("PING").query_async(&mut conn).await;
        self.checked(result).await.is_ok()
    }
}
