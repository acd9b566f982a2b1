//! Memory Store Module
//!
//! Process-local backing store. Expired entries are invisible to reads and
//! are physically removed by the background sweep (`tasks::spawn_cleanup_task`).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::entry::{current_timestamp_ms, CacheEntry, TTL_MISSING};
use super::CacheBackend;
use crate::error::{CacheError, Result};

// == Memory Store ==
/// In-memory key-value storage with TTL support.
///
/// Not shared across processes: two processes that both fall back to memory
/// see independent caches.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Fully-qualified key to entry
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = current_timestamp_ms();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }

    // == Length ==
    /// Returns the number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = current_timestamp_ms();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| !entry.is_expired_at(now))
            .count()
    }

    // == Is Empty ==
    /// Returns true if the store holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Option<u64>) -> Result<()> {
        let entry = CacheEntry::new(value, ttl);
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let removed = self.entries.write().await.remove(key);
        Ok(removed.is_some_and(|entry| !entry.is_expired()))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).is_some_and(|entry| !entry.is_expired()))
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<usize> {
        // No pattern delete here: collect the matching keys, then remove them.
        let mut entries = self.entries.write().await;
        let matching: Vec<String> = entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        for key in &matching {
            entries.remove(key);
        }

        debug!(prefix = %prefix, removed = matching.len(), "memory store prefix cleared");
        Ok(matching.len())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        let now = current_timestamp_ms();
        let entries = self.entries.read().await;
        Ok(keys
            .iter()
            .map(|key| {
                entries
                    .get(key)
                    .filter(|entry| !entry.is_expired_at(now))
                    .map(|entry| entry.value.clone())
            })
            .collect())
    }

    async fn mset(&self, batch: Vec<(String, String)>, ttl: Option<u64>) -> Result<()> {
        let mut entries = self.entries.write().await;
        for (key, value) in batch {
            entries.insert(key, CacheEntry::new(value, ttl));
        }
        Ok(())
    }

    async fn incr_by(&self, key: &str, by: i64) -> Result<i64> {
        let mut entries = self.entries.write().await;

        match entries.get_mut(key).filter(|entry| !entry.is_expired()) {
            Some(entry) => {
                let current: i64 =
                    entry
                        .value
                        .trim()
                        .parse()
                        .map_err(|_| CacheError::InvalidValue {
                            key: key.to_string(),
                            reason: "value is not an integer".to_string(),
                        })?;
                let next = current
                    .checked_add(by)
                    .ok_or_else(|| CacheError::InvalidValue {
                        key: key.to_string(),
                        reason: "increment would overflow".to_string(),
                    })?;
                // Value changes, expiry is preserved.
                entry.value = next.to_string();
                Ok(next)
            }
            None => {
                entries.insert(key.to_string(), CacheEntry::new(by.to_string(), None));
                Ok(by)
            }
        }
    }

    async fn expire(&self, key: &str, ttl: u64) -> Result<bool> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key).filter(|entry| !entry.is_expired()) {
            Some(entry) => {
                entry.expire_in(ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> Result<i64> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .map(CacheEntry::ttl_seconds)
            .unwrap_or(TTL_MISSING))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
