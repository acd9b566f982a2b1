//! Cache Manager Module
//!
//! The namespaced facade over a shared backing store. Every operation maps
//! backing-store failures to its degraded result (miss, `false`, `None`) and
//! logs them; only serialization of a caller's value can surface as an error.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::codec;
use super::options::{CacheOptions, OpOptions};
use super::stats::{CacheStats, StatsRecorder};
use crate::error::{CacheError, Result};
use crate::store::{SharedStore, TTL_MISSING};

// == Cache Manager ==
/// A namespaced view onto a shared backing store.
///
/// Cloning is cheap; clones share the store and the statistics counters.
/// Several managers built over the same store are independent views that
/// differ only in their defaults.
#[derive(Clone)]
pub struct CacheManager {
    store: SharedStore,
    options: Arc<CacheOptions>,
    stats: Arc<StatsRecorder>,
}

impl fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManager")
            .field("backend", &self.store.name())
            .field("options", &self.options)
            .finish()
    }
}

impl CacheManager {
    // == Constructor ==
    pub fn new(store: SharedStore, options: CacheOptions) -> Self {
        Self {
            store,
            options: Arc::new(options),
            stats: Arc::new(StatsRecorder::new()),
        }
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    pub fn namespace(&self) -> &str {
        &self.options.namespace
    }

    pub fn default_ttl(&self) -> u64 {
        self.options.ttl
    }

    /// The shared backing store handle.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.name()
    }

    /// Snapshot of this instance's counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    // == Key Construction ==
    /// Builds `{namespace}:{key}` using `namespace` or the instance default.
    pub fn build_key(&self, key: &str, namespace: Option<&str>) -> String {
        let namespace = namespace.unwrap_or(&self.options.namespace);
        format!("{}:{}", namespace, key)
    }

    fn resolve(&self, key: &str, opts: &OpOptions) -> String {
        self.build_key(key, opts.namespace.as_deref())
    }

    fn effective_ttl(&self, opts: &OpOptions) -> u64 {
        opts.ttl.unwrap_or(self.options.ttl)
    }

    fn absorb(&self, op: &'static str, key: &str, err: &CacheError) {
        self.stats.record_error();
        warn!(
            op,
            key = %key,
            backend = self.store.name(),
            error = %err,
            "cache operation failed"
        );
    }

    async fn fetch(&self, key: &str, opts: &OpOptions) -> Option<String> {
        if key.is_empty() {
            debug!("empty cache key rejected");
            self.stats.record_miss();
            return None;
        }

        let full = self.resolve(key, opts);
        match self.store.get(&full).await {
            Ok(Some(raw)) => Some(raw),
            Ok(None) => {
                debug!(key = %full, "cache miss");
                self.stats.record_miss();
                None
            }
            Err(err) => {
                self.absorb("get", &full, &err);
                self.stats.record_miss();
                None
            }
        }
    }

    // == Get ==
    /// Reads a typed value. `None` on miss, expiry, mismatched type or error.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_with(key, &OpOptions::NONE).await
    }

    pub async fn get_with<T: DeserializeOwned>(&self, key: &str, opts: &OpOptions) -> Option<T> {
        let raw = self.fetch(key, opts).await?;

        match codec::decode(raw, self.options.serialize) {
            Some(value) => {
                self.stats.record_hit();
                Some(value)
            }
            None => {
                debug!(key = %key, "cached payload does not fit the requested type");
                self.stats.record_miss();
                None
            }
        }
    }

    /// Reads a dynamic value; an undecodable payload comes back as a string.
    pub async fn get_value(&self, key: &str) -> Option<Value> {
        self.get_value_with(key, &OpOptions::NONE).await
    }

    pub async fn get_value_with(&self, key: &str, opts: &OpOptions) -> Option<Value> {
        let raw = self.fetch(key, opts).await?;
        self.stats.record_hit();
        Some(codec::decode_value(raw, self.options.serialize))
    }

    // == Set ==
    /// Writes a value with the default TTL.
    ///
    /// `Ok(false)` when the store did not confirm the write. `Err` only when
    /// `value` cannot be serialized.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<bool> {
        self.set_with(key, value, &OpOptions::NONE).await
    }

    pub async fn set_with<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        opts: &OpOptions,
    ) -> Result<bool> {
        let payload = codec::encode(value, self.options.serialize)?;
        if key.is_empty() {
            debug!("empty cache key rejected");
            return Ok(false);
        }

        let full = self.resolve(key, opts);
        let ttl = self.effective_ttl(opts);
        match self.store.set(&full, payload, Some(ttl)).await {
            Ok(()) => {
                debug!(key = %full, ttl, "cache set");
                self.stats.record_sets(1);
                Ok(true)
            }
            Err(err) => {
                self.absorb("set", &full, &err);
                Ok(false)
            }
        }
    }

    // == Delete ==
    /// Removes a key. True only if an entry existed and was removed.
    pub async fn del(&self, key: &str) -> bool {
        self.del_with(key, &OpOptions::NONE).await
    }

    pub async fn del_with(&self, key: &str, opts: &OpOptions) -> bool {
        self.remove_with(key, opts).await.unwrap_or(false)
    }

    /// Delete that tells a failed call (`None`) apart from a missing key
    /// (`Some(false)`).
    pub(crate) async fn remove_with(&self, key: &str, opts: &OpOptions) -> Option<bool> {
        if key.is_empty() {
            return Some(false);
        }
        let full = self.resolve(key, opts);
        match self.store.del(&full).await {
            Ok(removed) => {
                if removed {
                    self.stats.record_delete();
                }
                Some(removed)
            }
            Err(err) => {
                self.absorb("del", &full, &err);
                None
            }
        }
    }

    // == Has ==
    /// Existence check that never decodes the payload.
    pub async fn has(&self, key: &str) -> bool {
        self.has_with(key, &OpOptions::NONE).await
    }

    pub async fn has_with(&self, key: &str, opts: &OpOptions) -> bool {
        if key.is_empty() {
            return false;
        }
        let full = self.resolve(key, opts);
        match self.store.exists(&full).await {
            Ok(found) => found,
            Err(err) => {
                self.absorb("has", &full, &err);
                false
            }
        }
    }

    // == Clear ==
    /// Removes every key in `namespace` (or the instance namespace).
    ///
    /// Matches on `{namespace}:` so `user` never touches `users`. Returns true
    /// once the clear completed, even when nothing matched. Writes racing with
    /// a clear may or may not survive it.
    pub async fn clear(&self, namespace: Option<&str>) -> bool {
        let namespace = namespace.unwrap_or(&self.options.namespace);
        let prefix = format!("{}:", namespace);

        match self.store.clear_prefix(&prefix).await {
            Ok(removed) => {
                info!(namespace = %namespace, removed, "cache namespace cleared");
                true
            }
            Err(err) => {
                self.absorb("clear", &prefix, &err);
                false
            }
        }
    }

    // == Get Or Set ==
    /// Compute-if-absent with the default TTL.
    ///
    /// On a hit the factory is not run. On a miss it runs exactly once and its
    /// value is stored and returned. A factory error is logged, nothing is
    /// cached and `None` is returned.
    ///
    /// Concurrent callers that miss on the same key each run their factory;
    /// there is no request coalescing, so factories should be idempotent.
    pub async fn get_or_set<T, F, Fut, E>(&self, key: &str, factory: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: fmt::Display,
    {
        self.get_or_set_with(key, factory, &OpOptions::NONE).await
    }

    pub async fn get_or_set_with<T, F, Fut, E>(
        &self,
        key: &str,
        factory: F,
        opts: &OpOptions,
    ) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: fmt::Display,
    {
        if let Some(hit) = self.get_with::<T>(key, opts).await {
            return Some(hit);
        }

        match factory().await {
            Ok(value) => {
                if let Err(err) = self.set_with(key, &value, opts).await {
                    warn!(key = %key, error = %err, "computed value could not be cached");
                }
                Some(value)
            }
            Err(err) => {
                self.stats.record_error();
                warn!(key = %key, error = %err, "cache factory failed, nothing cached");
                None
            }
        }
    }

    // == Batch Get ==
    /// Reads several keys in one round trip. Slot `i` belongs to `keys[i]`.
    pub async fn mget<T: DeserializeOwned, K: AsRef<str>>(&self, keys: &[K]) -> Vec<Option<T>> {
        self.mget_with(keys, &OpOptions::NONE).await
    }

    pub async fn mget_with<T: DeserializeOwned, K: AsRef<str>>(
        &self,
        keys: &[K],
        opts: &OpOptions,
    ) -> Vec<Option<T>> {
        // Empty keys keep their slot but are never sent to the store.
        let full: Vec<String> = keys
            .iter()
            .map(|key| key.as_ref())
            .filter(|key| !key.is_empty())
            .map(|key| self.resolve(key, opts))
            .collect();

        let fetched = if full.is_empty() {
            Vec::new()
        } else {
            match self.store.mget(&full).await {
                Ok(raws) if raws.len() == full.len() => raws,
                Ok(raws) => {
                    let err = CacheError::Unavailable(format!(
                        "batch read returned {} values for {} keys",
                        raws.len(),
                        full.len()
                    ));
                    self.absorb("mget", &full.join(","), &err);
                    vec![None; full.len()]
                }
                Err(err) => {
                    self.absorb("mget", &full.join(","), &err);
                    vec![None; full.len()]
                }
            }
        };

        let mut fetched = fetched.into_iter();
        keys.iter()
            .map(|key| {
                let raw = if key.as_ref().is_empty() {
                    None
                } else {
                    fetched.next().flatten()
                };
                match raw.and_then(|r| codec::decode(r, self.options.serialize)) {
                    Some(value) => {
                        self.stats.record_hit();
                        Some(value)
                    }
                    None => {
                        self.stats.record_miss();
                        None
                    }
                }
            })
            .collect()
    }

    // == Batch Set ==
    /// Writes several entries with one shared TTL as a single batched call.
    ///
    /// `Ok(false)` if the batch failed or holds an empty key; entries it
    /// applied before failing are not rolled back. `Err` only when a value cannot be serialized, in which
    /// case nothing is written.
    pub async fn mset<T: Serialize, K: AsRef<str>>(&self, entries: &[(K, T)]) -> Result<bool> {
        self.mset_with(entries, &OpOptions::NONE).await
    }

    pub async fn mset_with<T: Serialize, K: AsRef<str>>(
        &self,
        entries: &[(K, T)],
        opts: &OpOptions,
    ) -> Result<bool> {
        let batch = entries
            .iter()
            .map(|(key, value)| -> Result<(String, String)> {
                Ok((
                    self.resolve(key.as_ref(), opts),
                    codec::encode(value, self.options.serialize)?,
                ))
            })
            .collect::<Result<Vec<(String, String)>>>()?;

        if entries.iter().any(|(key, _)| key.as_ref().is_empty()) {
            debug!("batch with an empty cache key rejected");
            return Ok(false);
        }
        if batch.is_empty() {
            return Ok(true);
        }

        let count = batch.len() as u64;
        let ttl = self.effective_ttl(opts);
        let keys: Vec<String> = batch.iter().map(|(key, _)| key.clone()).collect();
        match self.store.mset(batch, Some(ttl)).await {
            Ok(()) => {
                debug!(count, ttl, "cache batch set");
                self.stats.record_sets(count);
                Ok(true)
            }
            Err(err) => {
                self.absorb("mset", &keys.join(","), &err);
                Ok(false)
            }
        }
    }

    // == Increment ==
    /// Adds `by` to an integer counter and returns the new value.
    ///
    /// A missing key is created at `by` with no TTL; call [`expire`] to bound
    /// it. `None` means the increment failed, distinct from a genuine zero.
    ///
    /// [`expire`]: CacheManager::expire
    pub async fn increment(&self, key: &str, by: i64) -> Option<i64> {
        self.increment_with(key, by, &OpOptions::NONE).await
    }

    pub async fn increment_with(&self, key: &str, by: i64, opts: &OpOptions) -> Option<i64> {
        if key.is_empty() {
            return None;
        }
        let full = self.resolve(key, opts);
        match self.store.incr_by(&full, by).await {
            Ok(value) => Some(value),
            Err(err) => {
                self.absorb("increment", &full, &err);
                None
            }
        }
    }

    // == Expire ==
    /// Replaces the remaining TTL of an existing key. False if it is missing.
    pub async fn expire(&self, key: &str, ttl: u64) -> bool {
        self.expire_with(key, ttl, &OpOptions::NONE).await
    }

    pub async fn expire_with(&self, key: &str, ttl: u64, opts: &OpOptions) -> bool {
        if key.is_empty() {
            return false;
        }
        let full = self.resolve(key, opts);
        match self.store.expire(&full, ttl).await {
            Ok(applied) => applied,
            Err(err) => {
                self.absorb("expire", &full, &err);
                false
            }
        }
    }

    // == TTL ==
    /// Remaining seconds; `-1` for a key without expiry, `-2` when missing
    /// or on failure.
    pub async fn ttl(&self, key: &str) -> i64 {
        self.ttl_with(key, &OpOptions::NONE).await
    }

    pub async fn ttl_with(&self, key: &str, opts: &OpOptions) -> i64 {
        if key.is_empty() {
            return TTL_MISSING;
        }
        let full = self.resolve(key, opts);
        match self.store.ttl(&full).await {
            Ok(secs) => secs,
            Err(err) => {
                self.absorb("ttl", &full, &err);
                TTL_MISSING
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn manager(namespace: &str) -> CacheManager {
        CacheManager::new(
            Arc::new(MemoryStore::new()),
            CacheOptions::new(namespace, 60),
        )
    }

    #[test]
    fn test_build_key_uses_instance_namespace() {
        let cache = manager("product");
        assert_eq!(cache.build_key("42", None), "product:42");
        assert_eq!(cache.build_key("42", Some("search")), "search:42");
    }

    #[tokio::test]
    async fn test_key_override_round_trips_across_operations() {
        let cache = manager("app");
        let opts = OpOptions::namespace("ns1");

        assert!(cache.set_with("k", &1, &opts).await.unwrap());
        assert!(cache.has_with("k", &opts).await);
        assert!(!cache.has("k").await);
        assert_eq!(cache.get_with::<i32>("k", &opts).await, Some(1));
        assert!(cache.store().exists("ns1:k").await.unwrap());
        assert!(cache.del_with("k", &opts).await);
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected() {
        let cache = manager("app");

        assert!(!cache.set("", &1).await.unwrap());
        assert_eq!(cache.get::<i32>("").await, None);
        assert!(!cache.has("").await);
        assert_eq!(cache.increment("", 1).await, None);
    }

    #[tokio::test]
    async fn test_stats_track_hits_and_misses() {
        let cache = manager("app");

        cache.set("a", &1).await.unwrap();
        let _ = cache.get::<i32>("a").await;
        let _ = cache.get::<i32>("missing").await;
        cache.del("a").await;

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.sets, 1);
        assert_eq!(stats.deletes, 1);
        assert_eq!(stats.errors, 0);
    }

    #[tokio::test]
    async fn test_clones_share_counters() {
        let cache = manager("app");
        let clone = cache.clone();

        clone.set("a", "x").await.unwrap();
        assert_eq!(cache.stats().sets, 1);
    }

    #[tokio::test]
    async fn test_set_with_ttl_override() {
        let cache = manager("app");

        cache.set_with("short", &1, &OpOptions::ttl(5)).await.unwrap();
        cache.set("long", &1).await.unwrap();

        assert!((4..=5).contains(&cache.ttl("short").await));
        assert!((59..=60).contains(&cache.ttl("long").await));
    }
}
