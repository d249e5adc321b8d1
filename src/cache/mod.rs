//! Cache Module
//!
//! Provides a bounded in-memory cache with TTL expiration and pluggable
//! LRU/LFU eviction.

mod entry;
mod policy;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use policy::{EvictionKind, EvictionPolicy, Lfu, Lru};
pub use stats::CacheStats;
pub use store::BoundedCache;
