//! Market Cache - namespaced TTL cache for the marketplace backend
//!
//! A cache facade that routes to Redis when configured and to an in-process
//! store otherwise. Cache failures degrade to misses and never fail a request.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod ratelimit;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheManager, CacheOptions, CacheRegistry, Instance, OpOptions};
pub use config::Config;
pub use error::{CacheError, Result};
pub use ratelimit::{RateLimitDecision, RateLimiter};
pub use store::{CacheBackend, FallbackStore, MemoryStore, RedisStore, SharedStore};
pub use tasks::spawn_cleanup_task;
