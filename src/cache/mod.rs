//! Cache Module
//!
//! Namespaced, TTL-aware cache facade over a shared backing store.

pub mod codec;
pub mod invalidation;
pub mod keys;
mod manager;
mod memoize;
mod options;
mod registry;
mod stats;


// Re-export public types
pub use invalidation::{invalidate_order, invalidate_product, invalidate_seller, invalidate_user};
pub use keys::CacheKey;
pub use manager::CacheManager;
pub use memoize::{with_cache, Memoized};
pub use options::{CacheOptions, OpOptions, DEFAULT_NAMESPACE, DEFAULT_TTL};
pub use registry::{CacheRegistry, Instance};
pub use stats::{CacheStats, StatsRecorder};
