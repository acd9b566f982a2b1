//! Rate Limiter Module
//!
//! Fixed-window request counting on top of the cache's atomic increment.
//! The limiter fails open: if the cache cannot count, the request is allowed.

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::CacheManager;
use crate::store::TTL_PERSISTENT;

// == Decision ==
/// Outcome of one rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests counted in the current window, 0 when counting failed
    pub count: i64,
    /// Requests left in the current window
    pub remaining: u64,
    /// Seconds until the window resets
    pub reset_in: u64,
}

// == Rate Limiter ==
#[derive(Debug, Clone)]
pub struct RateLimiter {
    cache: CacheManager,
}

impl RateLimiter {
    /// Counts in the namespace of `cache` (normally the `rate_limit` instance).
    pub fn new(cache: CacheManager) -> Self {
        Self { cache }
    }

    fn window_key(identifier: &str, window_secs: u64) -> String {
        format!("{}:{}", identifier, window_secs)
    }

    /// Counts one request for `identifier` and decides whether it may proceed.
    pub async fn check(&self, identifier: &str, limit: u64, window_secs: u64) -> RateLimitDecision {
        let key = Self::window_key(identifier, window_secs);

        let Some(count) = self.cache.increment(&key, 1).await else {
            warn!(identifier = %identifier, "rate limit counter unavailable, allowing request");
            return RateLimitDecision {
                allowed: true,
                count: 0,
                remaining: limit,
                reset_in: window_secs,
            };
        };

        // The first hit opens the window. A counter left without expiry (lost
        // EXPIRE) is re-armed so it cannot block forever.
        let mut ttl = if count == 1 { TTL_PERSISTENT } else { self.cache.ttl(&key).await };
        if ttl == TTL_PERSISTENT {
            self.cache.expire(&key, window_secs).await;
            ttl = window_secs as i64;
        }

        let used = u64::try_from(count).unwrap_or(0);
        let allowed = used <= limit;
        if !allowed {
            debug!(identifier = %identifier, count, limit, "rate limit exceeded");
        }

        RateLimitDecision {
            allowed,
            count,
            remaining: limit.saturating_sub(used),
            reset_in: u64::try_from(ttl).unwrap_or(0),
        }
    }

    /// Drops the current window for `identifier`.
    pub async fn reset(&self, identifier: &str, window_secs: u64) -> bool {
        self.cache.del(&Self::window_key(identifier, window_secs)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheRegistry, Instance};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn limiter() -> RateLimiter {
        let registry = CacheRegistry::new(Arc::new(MemoryStore::new()));
        RateLimiter::new(registry.get(Instance::RateLimit).clone())
    }

    #[tokio::test]
    async fn test_allows_up_to_limit() {
        let limiter = limiter();

        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check("ip:1.2.3.4", 3, 60).await;
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let blocked = limiter.check("ip:1.2.3.4", 3, 60).await;
        assert!(!blocked.allowed);
        assert_eq!(blocked.count, 4);
        assert_eq!(blocked.remaining, 0);
        assert!(blocked.reset_in <= 60 && blocked.reset_in > 0);
    }

    #[tokio::test]
    async fn test_identifiers_are_counted_separately() {
        let limiter = limiter();

        assert!(limiter.check("user:1", 1, 60).await.allowed);
        assert!(limiter.check("user:2", 1, 60).await.allowed);
        assert!(!limiter.check("user:1", 1, 60).await.allowed);
    }

    #[tokio::test]
    async fn test_window_gets_expiry() {
        let limiter = limiter();
        limiter.check("login:bob", 5, 30).await;

        let ttl = limiter.cache.ttl("login:bob:30").await;
        assert!((29..=30).contains(&ttl));
    }

    #[tokio::test]
    async fn test_reset_reopens_window() {
        let limiter = limiter();

        limiter.check("k", 1, 60).await;
        assert!(!limiter.check("k", 1, 60).await.allowed);
        assert!(limiter.reset("k", 60).await);
        assert!(limiter.check("k", 1, 60).await.allowed);
    }
}
