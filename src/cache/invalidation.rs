//! Invalidation Module
//!
//! Write-side helpers that drop an entity's entry plus the namespaces derived
//! from it. Derived namespaces are cleared wholesale rather than selectively.
//!
//! Each helper works through any manager, since every instance views the same
//! store, and returns true only if every step completed.

use tracing::info;

use super::keys::{self, CacheKey};
use super::manager::CacheManager;

async fn drop_entity(cache: &CacheManager, key: &CacheKey) -> bool {
    // A missing entry counts as invalidated; only a failed call does not.
    cache.remove_with(key.key(), &key.options()).await.is_some()
}

async fn clear_all(cache: &CacheManager, namespaces: &[&str]) -> bool {
    let mut ok = true;
    for &namespace in namespaces {
        ok &= cache.clear(Some(namespace)).await;
    }
    ok
}

/// Drops a user profile and cached API responses.
pub async fn invalidate_user(cache: &CacheManager, id: &str) -> bool {
    let dropped = drop_entity(cache, &keys::user(id)).await;
    let cleared = clear_all(cache, &[keys::API]).await;
    info!(user_id = %id, "user cache invalidated");
    dropped && cleared
}

/// Drops a product and every cached search result.
pub async fn invalidate_product(cache: &CacheManager, id: &str) -> bool {
    let dropped = drop_entity(cache, &keys::product(id)).await;
    let cleared = clear_all(cache, &[keys::SEARCH]).await;
    info!(product_id = %id, "product cache invalidated");
    dropped && cleared
}

/// Drops an order and all analytics aggregates.
pub async fn invalidate_order(cache: &CacheManager, id: &str) -> bool {
    let dropped = drop_entity(cache, &keys::order(id)).await;
    let cleared = clear_all(cache, &[keys::ANALYTICS]).await;
    info!(order_id = %id, "order cache invalidated");
    dropped && cleared
}

/// Drops a seller plus search results and analytics that list their goods.
pub async fn invalidate_seller(cache: &CacheManager, id: &str) -> bool {
    let dropped = drop_entity(cache, &keys::seller(id)).await;
    let cleared = clear_all(cache, &[keys::SEARCH, keys::ANALYTICS]).await;
    info!(seller_id = %id, "seller cache invalidated");
    dropped && cleared
}
