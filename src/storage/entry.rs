//! Entry Module
//!
//! A stored payload together with its absolute expiration instant.

use bytes::Bytes;
use chrono::{DateTime, Duration, SecondsFormat, Utc};

// == Entry ==
/// Represents a single stored payload with its expiry.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored bytes
    pub payload: Bytes,
    /// Absolute expiration instant
    pub expires_at: DateTime<Utc>,
}

impl Entry {
    // == Constructor ==
    /// Creates a new entry that lives for `lifetime_secs` from now.
    pub fn new(payload: Bytes, lifetime_secs: u64) -> Self {
        Self {
            payload,
            expires_at: expiry_from_now(lifetime_secs),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry whose expiration instant is not in the future is expired.
    pub fn is_expired(&self) -> bool {
        is_past(self.expires_at)
    }
}

// == Utility Functions ==
/// Absolute instant `lifetime_secs` from now.
pub fn expiry_from_now(lifetime_secs: u64) -> DateTime<Utc> {
    let secs = i64::try_from(lifetime_secs).unwrap_or(i64::MAX);
    Duration::try_seconds(secs)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// True when `instant` is now or earlier.
pub fn is_past(instant: DateTime<Utc>) -> bool {
    Utc::now() >= instant
}

/// Formats an expiry as RFC 3339 text for the `.exp` record.
pub fn format_expiry(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses an `.exp` record, ignoring surrounding whitespace.
pub fn parse_expiry(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}
