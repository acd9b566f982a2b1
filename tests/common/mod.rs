//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use market_cache::{CacheBackend, CacheError, CacheManager, CacheOptions, MemoryStore, Result};

/// Backing store whose every call fails, counting the attempts.
#[derive(Default)]
pub struct FailingStore {
    pub calls: AtomicUsize,
}

impl FailingStore {
    fn fail<T>(&self) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".into()))
    }
}

#[async_trait]
impl CacheBackend for FailingStore {
    fn name(&self) -> &'static str {
        "failing"
    }
    async fn get(&self, _: &str) -> Result<Option<String>> {
        self.fail()
    }
    async fn set(&self, _: &str, _: String, _: Option<u64>) -> Result<()> {
        self.fail()
    }
    async fn del(&self, _: &str) -> Result<bool> {
        self.fail()
    }
    async fn exists(&self, _: &str) -> Result<bool> {
        self.fail()
    }
    async fn clear_prefix(&self, _: &str) -> Result<usize> {
        self.fail()
    }
    async fn mget(&self, _: &[String]) -> Result<Vec<Option<String>>> {
        self.fail()
    }
    async fn mset(&self, _: Vec<(String, String)>, _: Option<u64>) -> Result<()> {
        self.fail()
    }
    async fn incr_by(&self, _: &str, _: i64) -> Result<i64> {
        self.fail()
    }
    async fn expire(&self, _: &str, _: u64) -> Result<bool> {
        self.fail()
    }
    async fn ttl(&self, _: &str) -> Result<i64> {
        self.fail()
    }
    async fn ping(&self) -> Result<()> {
        self.fail()
    }
}

/// Facade over a fresh in-memory store.
pub fn memory_cache(namespace: &str, ttl: u64) -> CacheManager {
    CacheManager::new(Arc::new(MemoryStore::new()), CacheOptions::new(namespace, ttl))
}
