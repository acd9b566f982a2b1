//! API Handlers
//!
//! HTTP request handlers for the admin endpoints. Every key route addresses
//! one named instance, so keys are resolved inside that instance's namespace.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{CacheManager, CacheRegistry, OpOptions};
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    validate_key, ClearResponse, DeleteResponse, GetResponse, HealthResponse, InstanceStats,
    SetRequest, SetResponse, StatsResponse, TtlResponse,
};
use crate::store::{SharedStore, TTL_MISSING};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Named cache instances over the shared store
    pub caches: Arc<CacheRegistry>,
}

impl AppState {
    pub fn new(caches: CacheRegistry) -> Self {
        Self {
            caches: Arc::new(caches),
        }
    }

    /// Builds the registry over `store` with the configured `app` defaults.
    pub fn from_config(store: SharedStore, config: &Config) -> Self {
        Self::new(CacheRegistry::from_config(store, config))
    }

    fn instance(&self, name: &str) -> ApiResult<&CacheManager> {
        self.caches
            .by_name(name)
            .ok_or_else(|| ApiError::InvalidRequest(format!("Unknown cache instance: {}", name)))
    }
}

fn check_key(key: &str) -> ApiResult<()> {
    match validate_key(key) {
        Some(msg) => Err(ApiError::InvalidRequest(msg)),
        None => Ok(()),
    }
}

/// Handler for GET /cache/:instance/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path((instance, key)): Path<(String, String)>,
) -> ApiResult<Json<GetResponse>> {
    let cache = state.instance(&instance)?;
    check_key(&key)?;

    let full_key = cache.build_key(&key, None);
    let value = cache
        .get_value(&key)
        .await
        .ok_or_else(|| ApiError::NotFound(full_key.clone()))?;
    let ttl = cache.ttl(&key).await;

    Ok(Json(GetResponse::new(full_key, value, ttl)))
}

/// Handler for PUT /cache/:instance/:key
pub async fn set_handler(
    State(state): State<AppState>,
    Path((instance, key)): Path<(String, String)>,
    Json(req): Json<SetRequest>,
) -> ApiResult<Json<SetResponse>> {
    let cache = state.instance(&instance)?;
    check_key(&key)?;
    if let Some(msg) = req.validate() {
        return Err(ApiError::InvalidRequest(msg));
    }

    let ttl = req.ttl.unwrap_or(cache.default_ttl());
    let stored = cache.set_with(&key, &req.value, &OpOptions::ttl(ttl)).await?;
    if !stored {
        return Err(ApiError::Unavailable(format!(
            "write to '{}' was not confirmed",
            cache.build_key(&key, None)
        )));
    }

    Ok(Json(SetResponse::new(cache.build_key(&key, None), ttl)))
}

/// Handler for DELETE /cache/:instance/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((instance, key)): Path<(String, String)>,
) -> ApiResult<Json<DeleteResponse>> {
    let cache = state.instance(&instance)?;
    check_key(&key)?;

    let full_key = cache.build_key(&key, None);
    if !cache.del(&key).await {
        return Err(ApiError::NotFound(full_key));
    }

    Ok(Json(DeleteResponse::new(full_key)))
}

/// Handler for GET /cache/:instance/:key/ttl
pub async fn ttl_handler(
    State(state): State<AppState>,
    Path((instance, key)): Path<(String, String)>,
) -> ApiResult<Json<TtlResponse>> {
    let cache = state.instance(&instance)?;
    check_key(&key)?;

    let full_key = cache.build_key(&key, None);
    let ttl = cache.ttl(&key).await;
    if ttl == TTL_MISSING {
        return Err(ApiError::NotFound(full_key));
    }

    Ok(Json(TtlResponse { key: full_key, ttl }))
}

/// Handler for DELETE /cache/:instance
pub async fn clear_handler(
    State(state): State<AppState>,
    Path(instance): Path<String>,
) -> ApiResult<Json<ClearResponse>> {
    let cache = state.instance(&instance)?;

    if !cache.clear(None).await {
        return Err(ApiError::Unavailable(format!(
            "clear of '{}' did not complete",
            cache.namespace()
        )));
    }

    Ok(Json(ClearResponse::new(cache.namespace())))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let instances = state
        .caches
        .iter()
        .map(|(instance, cache)| InstanceStats::from_manager(instance, cache))
        .collect();

    Json(StatsResponse {
        backend: state.caches.backend_name().to_string(),
        instances,
    })
}

/// Handler for GET /health
///
/// Reports "degraded" while the primary store is unreachable; the service
/// keeps answering from the fallback in that state.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let reachable = state.caches.app().store().ping().await.is_ok();
    Json(HealthResponse::new(state.caches.backend_name(), reachable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn test_state() -> AppState {
        AppState::new(CacheRegistry::new(Arc::new(MemoryStore::new())))
    }

    fn path(instance: &str, key: &str) -> Path<(String, String)> {
        Path((instance.to_string(), key.to_string()))
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let req = SetRequest {
            value: json!({"name": "Widget", "price": 9.99}),
            ttl: None,
        };
        let result = set_handler(State(state.clone()), path("product", "42"), Json(req)).await;
        let response = result.unwrap();
        assert_eq!(response.key, "product:42");
        assert_eq!(response.ttl, 1800);

        let response = get_handler(State(state), path("product", "42")).await.unwrap();
        assert_eq!(response.value, json!({"name": "Widget", "price": 9.99}));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let result = get_handler(State(test_state()), path("app", "nonexistent")).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_instance() {
        let result = get_handler(State(test_state()), path("warehouse", "1")).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();
        state.caches.app().set("to_delete", "value").await.unwrap();

        let result = delete_handler(State(state.clone()), path("app", "to_delete")).await;
        assert!(result.is_ok());

        let result = delete_handler(State(state), path("app", "to_delete")).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_clear_handler_scopes_to_instance() {
        let state = test_state();
        state.caches.user().set("1", "alice").await.unwrap();
        state.caches.session().set("1", "token").await.unwrap();

        clear_handler(State(state.clone()), Path("user".to_string()))
            .await
            .unwrap();

        assert!(!state.caches.user().has("1").await);
        assert!(state.caches.session().has("1").await);
    }

    #[tokio::test]
    async fn test_stats_handler_lists_every_instance() {
        let response = stats_handler(State(test_state())).await;
        assert_eq!(response.backend, "memory");
        assert_eq!(response.instances.len(), 8);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler(State(test_state())).await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_ttl() {
        let req = SetRequest {
            value: json!("v"),
            ttl: Some(0),
        };
        let result = set_handler(State(test_state()), path("app", "k"), Json(req)).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }
}
