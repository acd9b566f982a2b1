//! Fallback Store Module
//!
//! Routes every call to the primary (distributed) store and, when that call
//! fails, serves the same call from the in-process store. There is no tiering:
//! a successful primary call never touches the fallback, and entries written
//! to the fallback during an outage are not replayed to the primary.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::{CacheBackend, MemoryStore, SharedStore};
use crate::error::{CacheError, Result};

// == Fallback Store ==
/// Primary store with a per-call in-memory fallback.
pub struct FallbackStore {
    primary: SharedStore,
    fallback: Arc<MemoryStore>,
}

impl FallbackStore {
    pub fn new(primary: SharedStore, fallback: Arc<MemoryStore>) -> Self {
        Self { primary, fallback }
    }

    /// The in-process store used while the primary fails.
    pub fn fallback(&self) -> &Arc<MemoryStore> {
        &self.fallback
    }

    fn degrade(&self, op: &'static str, key: &str, err: &CacheError) {
        warn!(
            op,
            key = %key,
            backend = self.primary.name(),
            error = %err,
            "primary cache store failed, serving from memory"
        );
    }
}

#[async_trait]
impl CacheBackend for FallbackStore {
    fn name(&self) -> &'static str {
        "redis+memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.primary.get(key).await {
            Ok(value) => Ok(value),
            Err(err) => {
                self.degrade("get", key, &err);
                self.fallback.get(key).await
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Option<u64>) -> Result<()> {
        match self.primary.set(key, value.clone(), ttl).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.degrade("set", key, &err);
                self.fallback.set(key, value, ttl).await
            }
        }
    }

    async fn del(&self, key: &str) -> Result<bool> {
        match self.primary.del(key).await {
            Ok(removed) => Ok(removed),
            Err(err) => {
                self.degrade("del", key, &err);
                self.fallback.del(key).await
            }
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self.primary.exists(key).await {
            Ok(found) => Ok(found),
            Err(err) => {
                self.degrade("exists", key, &err);
                self.fallback.exists(key).await
            }
        }
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<usize> {
        match self.primary.clear_prefix(prefix).await {
            Ok(removed) => Ok(removed),
            Err(err) => {
                self.degrade("clear", prefix, &err);
                self.fallback.clear_prefix(prefix).await
            }
        }
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        match self.primary.mget(keys).await {
            Ok(values) => Ok(values),
            Err(err) => {
                self.degrade("mget", &keys.join(","), &err);
                self.fallback.mget(keys).await
            }
        }
    }

    async fn mset(&self, entries: Vec<(String, String)>, ttl: Option<u64>) -> Result<()> {
        match self.primary.mset(entries.clone(), ttl).await {
            Ok(()) => Ok(()),
            Err(err) => {
                let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
                self.degrade("mset", &keys.join(","), &err);
                self.fallback.mset(entries, ttl).await
            }
        }
    }

    async fn incr_by(&self, key: &str, by: i64) -> Result<i64> {
        match self.primary.incr_by(key, by).await {
            Ok(value) => Ok(value),
            Err(err) => {
                self.degrade("incr", key, &err);
                self.fallback.incr_by(key, by).await
            }
        }
    }

    async fn expire(&self, key: &str, ttl: u64) -> Result<bool> {
        match self.primary.expire(key, ttl).await {
            Ok(applied) => Ok(applied),
            Err(err) => {
                self.degrade("expire", key, &err);
                self.fallback.expire(key, ttl).await
            }
        }
    }

    async fn ttl(&self, key: &str) -> Result<i64> {
        match self.primary.ttl(key).await {
            Ok(secs) => Ok(secs),
            Err(err) => {
                self.degrade("ttl", key, &err);
                self.fallback.ttl(key).await
            }
        }
    }

    /// Reports the primary's health; the fallback is always reachable.
    async fn ping(&self) -> Result<()> {
        self.primary.ping().await
    }
}
