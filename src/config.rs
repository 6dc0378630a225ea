//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Which storage substrate backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Shared Redis instance with native TTL
    Redis,
    /// Local directory with `.dat`/`.exp` record pairs
    Disk,
    /// In-process map, lost on restart
    Memory,
}

impl BackendKind {
    /// Parses a backend name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redis" => Some(BackendKind::Redis),
            "disk" | "file" | "filesystem" => Some(BackendKind::Disk),
            "memory" | "mem" => Some(BackendKind::Memory),
            _ => None,
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Selected storage backend
    pub backend: BackendKind,
    /// Redis connection string
    pub redis_url: String,
    /// Root directory of the filesystem backend
    pub storage_path: PathBuf,
    /// Lifetime of every stored entry, in seconds
    pub timeout_seconds: u64,
    /// Sweeper interval in seconds; 0 disables it
    pub cleanup_interval: u64,
    /// Largest accepted request body
    pub max_payload_bytes: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8003)
    /// - `STORAGE_BACKEND` - `redis`, `disk` or `memory` (default: redis)
    /// - `REDIS_URL` - Redis connection string (default: redis://localhost:6379)
    /// - `STORAGE_PATH` - Filesystem backend directory (default: ./data)
    /// - `TIMEOUT_SECONDS` - Entry lifetime in seconds (default: 3600)
    /// - `CLEANUP_INTERVAL` - Sweeper frequency in seconds, 0 = off (default: 60)
    /// - `MAX_PAYLOAD_BYTES` - Request body limit (default: 10 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            backend: env::var("STORAGE_BACKEND")
                .ok()
                .and_then(|v| BackendKind::parse(&v))
                .unwrap_or(defaults.backend),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            storage_path: env::var("STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            timeout_seconds: env::var("TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .unwrap_or(defaults.timeout_seconds),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval),
            max_payload_bytes: env::var("MAX_PAYLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_payload_bytes),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8003,
            backend: BackendKind::Redis,
            redis_url: "redis://localhost:6379".to_string(),
            storage_path: PathBuf::from("./data"),
            timeout_seconds: 3600,
            cleanup_interval: 60,
            max_payload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 8003);
        assert_eq!(config.backend, BackendKind::Redis);
        assert_eq!(config.redis_url, "redis://localhost:6379");
        assert_eq!(config.timeout_seconds, 3600);
        assert_eq!(config.cleanup_interval, 60);
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!(BackendKind::parse("redis"), Some(BackendKind::Redis));
        assert_eq!(BackendKind::parse(" Disk "), Some(BackendKind::Disk));
        assert_eq!(BackendKind::parse("MEMORY"), Some(BackendKind::Memory));
        assert_eq!(BackendKind::parse("postgres"), None);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SERVER_PORT");
        env::remove_var("STORAGE_BACKEND");
        env::remove_var("REDIS_URL");
        env::remove_var("STORAGE_PATH");
        env::remove_var("TIMEOUT_SECONDS");
        env::remove_var("CLEANUP_INTERVAL");
        env::remove_var("MAX_PAYLOAD_BYTES");

        let config = Config::from_env();
        assert_eq!(config.server_port, 8003);
        assert_eq!(config.backend, BackendKind::Redis);
        assert_eq!(config.storage_path, PathBuf::from("./data"));
        assert_eq!(config.timeout_seconds, 3600);
        assert_eq!(config.max_payload_bytes, 10 * 1024 * 1024);
    }
}
