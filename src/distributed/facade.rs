//! Distributed Cache Facade
//!
//! Fail-open cache API over an external key-value store. Store failures
//! never reach the caller: reads degrade to a miss and writes to `false`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::DistributedConfig;
use crate::distributed::{CacheRecord, Counters, DistributedStats, HealthReport, KvStore};
use crate::tasks::{spawn_access_worker, AccessTracker};

struct Inner {
    store: Arc<dyn KvStore>,
    config: DistributedConfig,
    counters: Counters,
    access: AccessTracker,
}

// == Distributed Cache ==
/// Cheaply cloneable handle; clones share counters and the access worker.
///
/// Keys passed to the facade are stored as `"{namespace}:{key}"`, where the
/// namespace comes from [`DistributedConfig`].
#[derive(Clone)]
pub struct DistributedCache {
    inner: Arc<Inner>,
}

impl DistributedCache {
    // == Constructor ==
    /// Wraps `store` and starts the access-count worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(store: Arc<dyn KvStore>, config: DistributedConfig) -> Self {
        let (access, _worker) =
            spawn_access_worker(Arc::clone(&store), config.access_queue_capacity);

        Self {
            inner: Arc::new(Inner {
                store,
                config,
                counters: Counters::default(),
                access,
            }),
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.inner.config.namespace, key)
    }

    fn store(&self) -> &dyn KvStore {
        self.inner.store.as_ref()
    }

    // == Get ==
    /// Reads and decodes a value. Any failure counts as a miss.
    ///
    /// A hit queues a background `access_count` update on the stored record.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full_key = self.full_key(key);

        let bytes = match self.store().get(&full_key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.inner.counters.record_miss();
                return None;
            }
            Err(err) => {
                warn!(key = %full_key, error = %err, "Distributed cache read failed, treating as miss");
                self.inner.counters.record_miss();
                return None;
            }
        };

        let decoded = CacheRecord::decode(&bytes).and_then(|record| serde_json::from_value(record.value));
        match decoded {
            Ok(value) => {
                self.inner.counters.record_hit();
                self.inner.access.track(full_key);
                Some(value)
            }
            Err(err) => {
                warn!(key = %full_key, error = %err, "Undecodable distributed cache record, treating as miss");
                self.inner.counters.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Writes `value` with `ttl` (or the configured default).
    ///
    /// Returns false, after logging, if encoding or the store write fails.
    pub async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool
    where
        T: Serialize + ?Sized,
    {
        let full_key = self.full_key(key);
        let ttl = ttl.unwrap_or(self.inner.config.default_ttl);

        let payload = serde_json::to_value(value)
            .and_then(|value| CacheRecord::new(value, ttl).encode());
        let payload = match payload {
            Ok(payload) => payload,
            Err(err) => {
                warn!(key = %full_key, error = %err, "Failed to encode distributed cache value");
                return false;
            }
        };

        match self.store().set(&full_key, payload, ttl).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(key = %full_key, error = %err, "Distributed cache write failed");
                false
            }
        }
    }

    // == Delete ==
    pub async fn delete(&self, key: &str) -> bool {
        let full_key = self.full_key(key);
        match self.store().delete(&full_key).await {
            Ok(existed) => existed,
            Err(err) => {
                warn!(key = %full_key, error = %err, "Distributed cache delete failed");
                false
            }
        }
    }

    // == Clear Namespace ==
    /// Deletes every key starting with `prefix`. Returns how many were removed.
    ///
    /// Best effort: individual delete failures are logged and skipped.
    pub async fn clear_namespace(&self, prefix: &str) -> usize {
        let scan = self.full_key(prefix);
        let keys = match self.store().keys(&scan).await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(prefix = %scan, error = %err, "Distributed cache prefix scan failed");
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys {
            match self.store().delete(&key).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(err) => debug!(key = %key, error = %err, "Skipping key during namespace clear"),
            }
        }
        debug!(prefix = %scan, removed, "Cleared distributed cache namespace");
        removed
    }

    // == Get Or Compute ==
    /// Returns the cached value, or computes, stores and returns it.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, ttl: Option<Duration>, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(value) = self.get(key).await {
            return value;
        }
        let value = compute().await;
        self.set(key, &value, ttl).await;
        value
    }

    // == Preload ==
    /// Warms the cache for keys that are not stored yet.
    ///
    /// For each absent key, `compute(key, params)` runs on a detached task
    /// and its `Some` result is written back. Presence checks do not touch
    /// hit/miss counters. Returns how many populations were started.
    pub async fn preload<I, P, F, Fut, T>(&self, entries: I, ttl: Option<Duration>, compute: F) -> usize
    where
        I: IntoIterator<Item = (String, P)>,
        P: Send + 'static,
        F: Fn(String, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<T>> + Send + 'static,
        T: Serialize + Send + Sync + 'static,
    {
        let compute = Arc::new(compute);
        let mut scheduled = 0;

        for (key, params) in entries {
            match self.store().get(&self.full_key(&key)).await {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(err) => {
                    warn!(key = %key, error = %err, "Skipping preload, store unavailable");
                    continue;
                }
            }

            let cache = self.clone();
            let compute = Arc::clone(&compute);
            tokio::spawn(async move {
                match (*compute)(key.clone(), params).await {
                    Some(value) => {
                        if !cache.set(&key, &value, ttl).await {
                            debug!(key = %key, "Preloaded value was not stored");
                        }
                    }
                    None => debug!(key = %key, "Preload produced no value"),
                }
            });
            scheduled += 1;
        }

        debug!(scheduled, "Scheduled distributed cache preload");
        scheduled
    }

    // == Stats ==
    /// Counter snapshot plus the current number of keys under the namespace.
    ///
    /// `cache_size` is 0 when the store cannot be reached.
    pub async fn stats(&self) -> DistributedStats {
        let size = self.cache_size().await.unwrap_or(0);
        self.inner.counters.snapshot(size)
    }

    // == Health Report ==
    pub async fn health_report(&self) -> HealthReport {
        let size = self.cache_size().await;
        let stats = self.inner.counters.snapshot(size.unwrap_or(0));
        HealthReport::evaluate(&stats, size.is_some())
    }

    async fn cache_size(&self) -> Option<usize> {
        let prefix = format!("{}:", self.inner.config.namespace);
        match self.store().keys(&prefix).await {
            Ok(keys) => Some(keys.len()),
            Err(err) => {
                warn!(error = %err, "Distributed cache size probe failed");
                None
            }
        }
    }

    pub fn namespace(&self) -> &str {
        &self.inner.config.namespace
    }
}
