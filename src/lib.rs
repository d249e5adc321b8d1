//! Cachepool - bounded caching and resource pooling
//!
//! Provides a bounded in-memory cache with pluggable LRU/LFU eviction and
//! TTL expiry, an async resource pool, deterministic cache-key derivation,
//! and a fail-open facade over an external key-value store. The `api`
//! module serves the caches over HTTP.

pub mod api;
pub mod cache;
pub mod config;
pub mod distributed;
pub mod error;
pub mod keys;
pub mod models;
pub mod pool;
pub mod tasks;

pub use api::AppState;
pub use cache::{BoundedCache, CacheStats, EvictionKind};
pub use config::{Config, DistributedConfig, PoolConfig};
pub use distributed::{DistributedCache, KvStore, MemoryKvStore};
pub use error::{CacheError, KeyError, PoolError, StoreError};
pub use keys::CacheKey;
pub use pool::{FnFactory, Lease, ResourceFactory, ResourcePool};
pub use tasks::spawn_cleanup_task;
