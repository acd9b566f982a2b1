//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheManager, Instance};

/// Response body for `GET /cache/:instance/:key`
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// Fully-qualified key
    pub key: String,
    /// The stored value
    pub value: Value,
    /// Remaining TTL in seconds, -1 without expiry
    pub ttl: i64,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value, ttl: i64) -> Self {
        Self {
            key: key.into(),
            value,
            ttl,
        }
    }
}

/// Response body for `PUT /cache/:instance/:key`
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// Fully-qualified key that was set
    pub key: String,
    /// TTL applied in seconds
    pub ttl: u64,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, ttl: u64) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            ttl,
        }
    }
}

/// Response body for `DELETE /cache/:instance/:key`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// Fully-qualified key that was deleted
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for `DELETE /cache/:instance`
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
    /// Namespace that was cleared
    pub namespace: String,
}

impl ClearResponse {
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            message: format!("Namespace '{}' cleared", namespace),
            namespace,
        }
    }
}

/// Response body for `GET /cache/:instance/:key/ttl`
#[derive(Debug, Clone, Serialize)]
pub struct TtlResponse {
    pub key: String,
    pub ttl: i64,
}

/// Counters for one named instance
#[derive(Debug, Clone, Serialize)]
pub struct InstanceStats {
    pub name: String,
    pub namespace: String,
    pub default_ttl: u64,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub errors: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl InstanceStats {
    pub fn from_manager(instance: Instance, cache: &CacheManager) -> Self {
        let stats = cache.stats();
        Self {
            name: instance.name().to_string(),
            namespace: cache.namespace().to_string(),
            default_ttl: cache.default_ttl(),
            hits: stats.hits,
            misses: stats.misses,
            sets: stats.sets,
            deletes: stats.deletes,
            errors: stats.errors,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Active backing store
    pub backend: String,
    pub instances: Vec<InstanceStats>,
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy", or "degraded" while the primary store is unreachable
    pub status: String,
    /// Active backing store
    pub backend: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn new(backend: impl Into<String>, store_reachable: bool) -> Self {
        let status = if store_reachable { "healthy" } else { "degraded" };
        Self {
            status: status.to_string(),
            backend: backend.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
