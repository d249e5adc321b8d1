//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support and
//! the access metadata eviction policies rank on.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// Besides wall-clock style `Instant`s, every entry carries two logical
/// ticks taken from the owning cache's counter. Policies order by ticks so
/// two operations inside the same clock granule still rank deterministically.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation instant
    pub created_at: Instant,
    /// Last successful read, None until the first hit
    pub last_accessed: Option<Instant>,
    /// Number of successful reads since insertion
    pub access_count: u64,
    /// Time to live, None = no expiration
    pub ttl: Option<Duration>,
    /// Logical tick of insertion
    pub(crate) inserted_tick: u64,
    /// Logical tick of the last read
    pub(crate) accessed_tick: Option<u64>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Optional time to live
    /// * `tick` - Logical insertion tick
    pub fn new(value: V, ttl: Option<Duration>, tick: u64) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            last_accessed: None,
            access_count: 0,
            ttl,
            inserted_tick: tick,
            accessed_tick: None,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once strictly more than `ttl` has elapsed since
    /// creation. Entries without a TTL never expire.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a caller-supplied instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(self.created_at) > ttl,
            None => false,
        }
    }

    // == Record Access ==
    /// Marks a successful read.
    pub fn record_access(&mut self, tick: u64) {
        self.access_count += 1;
        self.last_accessed = Some(Instant::now());
        self.accessed_tick = Some(tick);
    }

    // == Time To Live ==
    /// Returns the remaining TTL, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.ttl
            .map(|ttl| ttl.saturating_sub(self.created_at.elapsed()))
    }

    /// Recency rank used by LRU: last read, falling back to insertion.
    pub(crate) fn recency_tick(&self) -> u64 {
        self.accessed_tick.unwrap_or(self.inserted_tick)
    }
}
