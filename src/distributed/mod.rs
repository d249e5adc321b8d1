//! Distributed Cache Module
//!
//! A fail-open cache facade over an external key-value store, with
//! hit/miss telemetry and health reporting.

mod facade;
mod record;
mod stats;
mod store;

pub use facade::DistributedCache;
pub use record::CacheRecord;
pub(crate) use stats::Counters;
pub use stats::{
    size_factor, DistributedStats, HealthReport, HealthStatus, LARGE_CACHE_ENTRIES,
    LOW_HIT_RATE, SMALL_CACHE_ENTRIES, TARGET_HIT_RATE,
};
pub use store::{KvStore, MemoryKvStore};
