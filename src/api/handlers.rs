//! API Handlers
//!
//! HTTP request handlers for each cache service endpoint. Writes go to the
//! bounded local cache and through to the distributed tier; reads fall back
//! to the distributed tier on a local miss.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{debug, warn};

use crate::cache::BoundedCache;
use crate::config::Config;
use crate::distributed::{DistributedCache, MemoryKvStore};
use crate::error::{CacheError, Result};
use crate::models::{
    CacheTier, ClearNamespaceResponse, DeleteResponse, DeriveKeyRequest, DeriveKeyResponse,
    GetResponse, HealthResponse, SetRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// Both tiers synchronize internally, so handlers never take an outer lock.
#[derive(Clone)]
pub struct AppState {
    /// Bounded in-process cache
    pub cache: Arc<BoundedCache<String, String>>,
    /// Fail-open second tier
    pub distributed: DistributedCache,
}

impl AppState {
    pub fn new(cache: BoundedCache<String, String>, distributed: DistributedCache) -> Self {
        Self {
            cache: Arc::new(cache),
            distributed,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// The distributed tier is backed by an in-process [`MemoryKvStore`].
    /// Must be called from within a Tokio runtime.
    pub fn from_config(config: &Config) -> Self {
        let mut cache = BoundedCache::new(config.max_entries, config.eviction_policy);
        if config.default_ttl > 0 {
            cache = cache.with_default_ttl(Duration::from_secs(config.default_ttl));
        }

        let store = Arc::new(MemoryKvStore::new());
        let distributed = DistributedCache::new(store, config.distributed.clone());

        Self::new(cache, distributed)
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair locally and writes it through to the
/// distributed tier. A failed replication does not fail the request.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    let ttl = req.validated_ttl()?;
    state.cache.set(req.key.clone(), req.value.clone(), ttl);

    let replicated = state.distributed.set(&req.key, &req.value, ttl).await;
    if !replicated {
        warn!(key = %req.key, "Write-through to distributed tier failed");
    }

    Ok(Json(SetResponse::new(req.key, replicated)))
}

/// Handler for GET /get/:key
///
/// Local hits answer directly; a local miss consults the distributed tier.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    if let Some(value) = state.cache.get(&key) {
        return Ok(Json(GetResponse::new(key, value, CacheTier::Local)));
    }

    match state.distributed.get::<String>(&key).await {
        Some(value) => {
            debug!(key = %key, "Served from distributed tier");
            Ok(Json(GetResponse::new(key, value, CacheTier::Distributed)))
        }
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Removes the key from both tiers; 404 only when neither held it.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let local = state.cache.delete(&key);
    let remote = state.distributed.delete(&key).await;

    if !local && !remote {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /keys
///
/// Derives the cache key clients should use for a parameter set.
pub async fn derive_key_handler(
    Json(req): Json<DeriveKeyRequest>,
) -> Result<Json<DeriveKeyResponse>> {
    let key = req.into_cache_key()?.derive()?;
    Ok(Json(DeriveKeyResponse { key }))
}

/// Handler for DELETE /namespace/:prefix
///
/// Invalidates every distributed entry under `prefix`. The local tier is
/// left to expire on its own.
pub async fn clear_namespace_handler(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
) -> Json<ClearNamespaceResponse> {
    let removed = state.distributed.clear_namespace(&prefix).await;
    Json(ClearNamespaceResponse { prefix, removed })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let local = state.cache.stats();
    let distributed = state.distributed.stats().await;

    Json(StatsResponse::new(local, distributed))
}

/// Handler for GET /health
///
/// The service itself is healthy whenever it answers; the distributed
/// tier's condition is reported alongside.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let report = state.distributed.health_report().await;
    Json(HealthResponse::healthy(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EvictionKind;
    use crate::config::DistributedConfig;
    use crate::distributed::HealthStatus;

    fn test_state() -> AppState {
        let cache = BoundedCache::new(100, EvictionKind::Lru);
        let store = Arc::new(MemoryKvStore::new());
        AppState::new(cache, DistributedCache::new(store, DistributedConfig::default()))
    }

    fn set_request(key: &str, value: &str) -> SetRequest {
        SetRequest {
            key: key.to_string(),
            value: value.to_string(),
            ttl: None,
        }
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let result = set_handler(State(state.clone()), Json(set_request("k", "v"))).await;
        assert!(result.is_ok());
        assert!(result.unwrap().replicated);

        let response = get_handler(State(state), Path("k".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, "v");
        assert_eq!(response.source, CacheTier::Local);
    }

    #[tokio::test]
    async fn test_get_falls_back_to_distributed() {
        let state = test_state();
        set_handler(State(state.clone()), Json(set_request("k", "v")))
            .await
            .unwrap();

        // Drop the local copy only
        assert!(state.cache.delete(&"k".to_string()));

        let response = get_handler(State(state), Path("k".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, "v");
        assert_eq!(response.source, CacheTier::Distributed);
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state();

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();
        set_handler(State(state.clone()), Json(set_request("to_delete", "value")))
            .await
            .unwrap();

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_ok());

        let result = get_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_err());

        let result = delete_handler(State(state), Path("to_delete".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();
        set_handler(State(state.clone()), Json(set_request("a", "1")))
            .await
            .unwrap();
        let _ = get_handler(State(state.clone()), Path("a".to_string())).await;
        let _ = get_handler(State(state.clone()), Path("missing".to_string())).await;

        let response = stats_handler(State(state)).await;
        assert_eq!(response.local.hits, 1);
        assert_eq!(response.local.misses, 1);
        assert_eq!(response.local.size, 1);
        // Only the fallback read reached the distributed tier
        assert_eq!(response.distributed.miss_count, 1);
        assert_eq!(response.distributed.cache_size, 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler(State(test_state())).await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.distributed.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = test_state();

        let result = set_handler(State(state), Json(set_request("", "value"))).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_derive_key_handler() {
        let req = DeriveKeyRequest {
            namespace: "models".to_string(),
            params: serde_json::json!({"b": 2, "a": 1}),
            qualifiers: Default::default(),
        };
        let response = derive_key_handler(Json(req)).await.unwrap();
        assert!(response.key.starts_with("models:"));

        let blank = DeriveKeyRequest {
            namespace: " ".to_string(),
            params: serde_json::Value::Null,
            qualifiers: Default::default(),
        };
        let result = derive_key_handler(Json(blank)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_clear_namespace_handler() {
        let state = test_state();
        for key in ["models:a", "models:b", "other"] {
            set_handler(State(state.clone()), Json(set_request(key, "v")))
                .await
                .unwrap();
        }

        let response =
            clear_namespace_handler(State(state.clone()), Path("models:".to_string())).await;
        assert_eq!(response.removed, 2);
        assert_eq!(state.distributed.stats().await.cache_size, 1);
    }
}
