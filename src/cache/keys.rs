//! Cache Key Module
//!
//! Naming conventions for marketplace entities. Each helper returns the
//! namespace and raw key that together address one entry; they are
//! conventions for calling code, nothing enforces them.

use std::fmt;

use serde_json::Value;

use super::options::OpOptions;

// == Namespaces ==
pub const USER: &str = "user";
pub const PRODUCT: &str = "product";
pub const ORDER: &str = "order";
pub const SELLER: &str = "seller";
pub const PROPERTY: &str = "property";
pub const SEARCH: &str = "search";
pub const ANALYTICS: &str = "analytics";
pub const DELIVERY: &str = "delivery";
pub const API: &str = "api";

// == Cache Key ==
/// A raw key paired with the namespace it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: &'static str,
    key: String,
}

impl CacheKey {
    pub fn new(namespace: &'static str, key: impl Into<String>) -> Self {
        Self {
            namespace,
            key: key.into(),
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    /// The raw key, without namespace.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Call options that route an operation into this key's namespace.
    pub fn options(&self) -> OpOptions {
        OpOptions::namespace(self.namespace)
    }
}

/// Displays the fully-qualified `{namespace}:{key}` form.
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.key)
    }
}

pub fn user(id: impl fmt::Display) -> CacheKey {
    CacheKey::new(USER, id.to_string())
}

pub fn product(id: impl fmt::Display) -> CacheKey {
    CacheKey::new(PRODUCT, id.to_string())
}

pub fn order(id: impl fmt::Display) -> CacheKey {
    CacheKey::new(ORDER, id.to_string())
}

pub fn seller(id: impl fmt::Display) -> CacheKey {
    CacheKey::new(SELLER, id.to_string())
}

pub fn property(id: impl fmt::Display) -> CacheKey {
    CacheKey::new(PROPERTY, id.to_string())
}

/// Search results for `query` under `filters`.
///
/// Filters are embedded as compact JSON. Object keys serialize in sorted
/// order, so equal filter sets always produce the same key.
pub fn search(query: &str, filters: &Value) -> CacheKey {
    CacheKey::new(SEARCH, format!("{}:{}", query, filters))
}

/// Aggregates of `kind` over `period` (e.g. `sales`, `2024-05`).
pub fn analytics(kind: &str, period: &str) -> CacheKey {
    CacheKey::new(ANALYTICS, format!("{}:{}", kind, period))
}

/// One delivery agent's schedule for one day.
pub fn delivery(agent_id: impl fmt::Display, date: &str) -> CacheKey {
    CacheKey::new(DELIVERY, format!("{}:{}", agent_id, date))
}
