//! Bounded Cache Module
//!
//! Main cache engine combining HashMap storage, a pluggable eviction policy
//! and lazy TTL expiration behind a single lock.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, EvictionKind, EvictionPolicy};

struct Inner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    stats: CacheStats,
    /// Logical clock for recency ordering
    tick: u64,
}

impl<K, V> Inner<K, V> {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

// == Bounded Cache ==
/// Thread-safe cache with a size bound, optional TTLs and pluggable eviction.
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct BoundedCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    policy: Box<dyn EvictionPolicy<K, V>>,
    max_size: usize,
    default_ttl: Option<Duration>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + 'static,
{
    // == Constructor ==
    /// Creates a cache with the given capacity using one of the built-in policies.
    pub fn new(max_size: usize, kind: EvictionKind) -> Self {
        Self::with_policy(max_size, kind.into_policy())
    }

    /// Creates a cache with a custom eviction policy.
    pub fn with_policy(max_size: usize, policy: Box<dyn EvictionPolicy<K, V>>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                stats: CacheStats::new(),
                tick: 0,
            }),
            policy,
            max_size,
            default_ttl: None,
        }
    }

    /// TTL applied by [`set`](Self::set) when the caller passes none.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns None if the key is absent or expired. Expired entries are
    /// removed on the spot. A hit bumps the entry's access metadata.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let expired = match inner.entries.get(key) {
            None => {
                inner.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(),
        };

        if expired {
            inner.entries.remove(key);
            inner.stats.record_expirations(1);
            inner.stats.record_miss();
            return None;
        }

        let tick = inner.next_tick();
        let entry = inner.entries.get_mut(key)?;
        entry.record_access(tick);
        let value = entry.value.clone();
        inner.stats.record_hit();
        Some(value)
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// Overwrites any existing entry and resets its access metadata. If the
    /// insert pushes the cache past `max_size`, the policy's victims are
    /// removed before returning.
    pub fn set(&self, key: K, value: V, ttl: Option<Duration>) {
        let ttl = ttl.or(self.default_ttl);
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let tick = inner.next_tick();
        inner.entries.insert(key, CacheEntry::new(value, ttl, tick));

        if inner.entries.len() > self.max_size {
            let victims = self.policy.select_victims(&inner.entries, self.max_size);
            let mut evicted = 0;
            for victim in &victims {
                if inner.entries.remove(victim).is_some() {
                    evicted += 1;
                }
            }
            inner.stats.record_evictions(evicted);
            debug!(
                policy = self.policy.name(),
                evicted, "Evicted entries over capacity"
            );
        }

        debug_assert!(inner.entries.len() <= self.max_size);
    }

    // == Delete ==
    /// Removes an entry by key, returning whether it was present.
    pub fn delete(&self, key: &K) -> bool {
        self.inner.lock().entries.remove(key).is_some()
    }

    // == Clear ==
    /// Drops every entry. Counters are kept.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    // == Contains ==
    /// Returns true if a live entry exists, without touching access metadata.
    pub fn contains(&self, key: &K) -> bool {
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let total_accesses = inner.entries.values().map(|e| e.access_count).sum();
        let mut stats = inner.stats.clone();
        stats.set_occupancy(inner.entries.len(), self.max_size, total_accesses);
        stats
    }

    // == Purge Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let now = Instant::now();

        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - inner.entries.len();

        inner.stats.record_expirations(removed);
        removed
    }

    // == Length ==
    /// Returns the current number of entries, expired-but-unread included.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }
}

impl<K, V> fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("policy", &self.policy.name())
            .field("max_size", &self.max_size)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn lru(max: usize) -> BoundedCache<String, i32> {
        BoundedCache::new(max, EvictionKind::Lru)
    }

    fn lfu(max: usize) -> BoundedCache<String, i32> {
        BoundedCache::new(max, EvictionKind::Lfu)
    }

    fn key(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn test_cache_new() {
        let cache = lru(100);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.max_size(), 100);
        assert_eq!(cache.policy_name(), "lru");
    }

    #[test]
    fn test_set_and_get() {
        let cache = lru(100);
        cache.set(key("a"), 1, None);

        assert_eq!(cache.get(&key("a")), Some(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let cache = lru(100);
        assert_eq!(cache.get(&key("missing")), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_empty_value_is_a_hit() {
        let cache: BoundedCache<String, Option<String>> = BoundedCache::new(10, EvictionKind::Lru);
        cache.set(key("nothing"), None, None);
        cache.set(key("blank"), Some(String::new()), None);

        assert_eq!(cache.get(&key("nothing")), Some(None));
        assert_eq!(cache.get(&key("blank")), Some(Some(String::new())));
        assert_eq!(cache.stats().hits, 2);
    }

    #[test]
    fn test_delete() {
        let cache = lru(100);
        cache.set(key("a"), 1, None);

        assert!(cache.delete(&key("a")));
        assert!(!cache.delete(&key("a")));
        assert!(cache.is_empty());
        assert_eq!(cache.get(&key("a")), None);
    }

    #[test]
    fn test_clear() {
        let cache = lru(100);
        cache.set(key("a"), 1, None);
        cache.set(key("b"), 2, None);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get(&key("a")), None);
    }

    #[test]
    fn test_overwrite_resets_access_count() {
        let cache = lru(100);
        cache.set(key("a"), 1, None);
        cache.get(&key("a"));
        cache.get(&key("a"));
        assert_eq!(cache.stats().total_accesses, 2);

        cache.set(key("a"), 2, None);
        assert_eq!(cache.stats().total_accesses, 0);
        assert_eq!(cache.get(&key("a")), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_ttl_expiration() {
        let cache = lru(100);
        cache.set(key("a"), 1, Some(Duration::from_secs(1)));

        assert_eq!(cache.get(&key("a")), Some(1));

        sleep(Duration::from_millis(1500));

        assert_eq!(cache.get(&key("a")), None);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_default_ttl_applies() {
        let cache = lru(100).with_default_ttl(Duration::from_millis(100));
        cache.set(key("a"), 1, None);
        cache.set(key("b"), 2, Some(Duration::from_secs(60)));

        sleep(Duration::from_millis(200));

        assert!(!cache.contains(&key("a")));
        assert!(cache.contains(&key("b")));
    }

    #[test]
    fn test_lru_eviction_order() {
        let cache = lru(2);
        cache.set(key("a"), 1, None);
        cache.set(key("b"), 2, None);
        cache.get(&key("a"));
        cache.set(key("c"), 3, None);

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&key("a")));
        assert!(!cache.contains(&key("b")));
        assert!(cache.contains(&key("c")));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_lru_without_reads_evicts_oldest_insert() {
        let cache = lru(3);
        for (i, k) in ["k1", "k2", "k3", "k4"].iter().enumerate() {
            cache.set(key(k), i as i32, None);
        }

        assert!(!cache.contains(&key("k1")));
        assert!(cache.contains(&key("k4")));
    }

    #[test]
    fn test_lfu_eviction_order() {
        let cache = lfu(2);
        cache.set(key("a"), 1, None);
        cache.set(key("b"), 2, None);
        cache.get(&key("a"));
        cache.get(&key("a"));
        cache.set(key("c"), 3, None);

        assert!(cache.contains(&key("a")));
        assert!(!cache.contains(&key("b")));
        assert!(cache.contains(&key("c")));
    }

    #[test]
    fn test_stats() {
        let cache = lru(100);
        cache.set(key("a"), 1, None);
        cache.set(key("b"), 2, None);
        cache.get(&key("a"));
        cache.get(&key("a"));
        cache.get(&key("b"));
        cache.get(&key("b"));
        let _ = cache.get(&key("nonexistent"));

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.max_size, 100);
        assert_eq!(stats.total_accesses, 4);
        assert_eq!(stats.average_accesses, 2.0);
        assert_eq!(stats.hits, 4);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_purge_expired() {
        let cache = lru(100);
        cache.set(key("a"), 1, Some(Duration::from_millis(100)));
        cache.set(key("b"), 2, Some(Duration::from_secs(10)));

        sleep(Duration::from_millis(200));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key("b")), Some(2));
    }

    #[test]
    fn test_concurrent_sets_respect_capacity() {
        use std::sync::Arc;
        use std::thread;

        let cache = Arc::new(lru(16));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..200 {
                        cache.set(format!("t{}-{}", t, i), i, None);
                        assert!(cache.len() <= 16);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 16);
    }
}
