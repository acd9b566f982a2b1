//! Memory Entry Module
//!
//! Defines a single in-memory entry with an optional absolute expiry.

use std::time::{SystemTime, UNIX_EPOCH};

/// `ttl` sentinel for an entry that exists without an expiry.
pub const TTL_PERSISTENT: i64 = -1;

/// `ttl` sentinel for a key that does not exist.
pub const TTL_MISSING: i64 = -2;

// == Cache Entry ==
/// A serialized payload plus expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The serialized payload
    pub value: String,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry. `Some(0)` produces an entry that is already expired.
    pub fn new(value: String, ttl_seconds: Option<u64>) -> Self {
        let now = current_timestamp_ms();

        Self {
            value,
            expires_at: ttl_seconds.map(|ttl| deadline_from(now, ttl)),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its deadline, so a
    /// TTL of zero is never readable.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against a caller-supplied clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    // == Expire ==
    /// Replaces the expiry deadline, leaving the value untouched.
    pub fn expire_in(&mut self, ttl_seconds: u64) {
        self.expires_at = Some(deadline_from(current_timestamp_ms(), ttl_seconds));
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }

    /// Remaining TTL in whole seconds using the Redis `TTL` conventions:
    /// `-1` for no expiry, `-2` once the entry has expired.
    pub fn ttl_seconds(&self) -> i64 {
        match self.ttl_remaining_ms() {
            None => TTL_PERSISTENT,
            Some(0) => TTL_MISSING,
            Some(ms) => ((ms + 500) / 1000) as i64,
        }
    }
}

fn deadline_from(now_ms: u64, ttl_seconds: u64) -> u64 {
    now_ms.saturating_add(ttl_seconds.saturating_mul(1000))
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
