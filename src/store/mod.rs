//! Backing Store Module
//!
//! The `CacheBackend` trait is the seam between the cache facade and the
//! storage that actually holds entries. Keys reaching a backend are already
//! fully qualified (`{namespace}:{key}`) and values already serialized.
//!
//! # Implementations
//! - [`MemoryStore`]: process-local map with a periodic expiry sweep
//! - [`RedisStore`]: Redis over a reconnecting `ConnectionManager`
//! - [`FallbackStore`]: Redis first, memory store when a Redis call fails

mod entry;
mod fallback;
mod memory;
mod redis_store;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

pub use entry::{current_timestamp_ms, CacheEntry, TTL_MISSING, TTL_PERSISTENT};
pub use fallback::FallbackStore;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// A backing store handle shared by every facade instance in the process.
pub type SharedStore = Arc<dyn CacheBackend>;

// == Cache Backend Trait ==
/// Key-value operations every backing store provides.
///
/// A `ttl` of `None` stores without expiry. `Some(0)` writes an entry that is
/// already expired, which both stores treat as absent.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend identifier used in logs and health output.
    fn name(&self) -> &'static str;

    /// Returns the raw payload, `None` when missing or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a payload, replacing any previous value and expiry.
    async fn set(&self, key: &str, value: String, ttl: Option<u64>) -> Result<()>;

    /// Removes a key. Returns true if it existed.
    async fn del(&self, key: &str) -> Result<bool>;

    /// Existence check that never inspects the payload.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Removes every key starting with `prefix`. Returns how many were removed.
    async fn clear_prefix(&self, prefix: &str) -> Result<usize>;

    /// Batched read. The result has one slot per requested key, in order.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>>;

    /// Batched write with a single shared TTL.
    async fn mset(&self, entries: Vec<(String, String)>, ttl: Option<u64>) -> Result<()>;

    /// Adds `by` to an integer payload, creating it at `by` without expiry.
    async fn incr_by(&self, key: &str, by: i64) -> Result<i64>;

    /// Sets the remaining TTL of an existing key. Returns false if missing.
    async fn expire(&self, key: &str, ttl: u64) -> Result<bool>;

    /// Remaining seconds, [`TTL_PERSISTENT`] or [`TTL_MISSING`].
    async fn ttl(&self, key: &str) -> Result<i64>;

    /// Liveness check.
    async fn ping(&self) -> Result<()>;
}
