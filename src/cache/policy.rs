//! Eviction Policy Module
//!
//! Pure victim selection for the bounded cache. A policy never mutates the
//! entries it is shown; the cache removes whatever keys it returns.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cache::CacheEntry;

// == Eviction Policy ==
/// Decides which entries to drop when the cache exceeds its bound.
pub trait EvictionPolicy<K, V>: Send + Sync {
    /// Returns `entries.len() - max_size` keys to evict, or nothing when the
    /// cache is within bounds.
    fn select_victims(&self, entries: &HashMap<K, CacheEntry<V>>, max_size: usize) -> Vec<K>;

    /// Short name used in logs and stats.
    fn name(&self) -> &'static str;
}

/// Sorts candidates by `rank` and keeps the first `count - max_size`.
///
/// Ties fall back to insertion order, so the earliest created entry goes first.
fn lowest_ranked<K, V, R>(
    entries: &HashMap<K, CacheEntry<V>>,
    max_size: usize,
    rank: impl Fn(&CacheEntry<V>) -> R,
) -> Vec<K>
where
    K: Clone,
    R: Ord,
{
    let excess = entries.len().saturating_sub(max_size);
    if excess == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<(R, u64, &K)> = entries
        .iter()
        .map(|(key, entry)| (rank(entry), entry.inserted_tick, key))
        .collect();
    candidates.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    candidates
        .into_iter()
        .take(excess)
        .map(|(_, _, key)| key.clone())
        .collect()
}

// == LRU ==
/// Least Recently Used: oldest read goes first, unread entries rank by creation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lru;

impl<K, V> EvictionPolicy<K, V> for Lru
where
    K: Eq + Hash + Clone + Send + Sync,
{
    fn select_victims(&self, entries: &HashMap<K, CacheEntry<V>>, max_size: usize) -> Vec<K> {
        lowest_ranked(entries, max_size, |entry| entry.recency_tick())
    }

    fn name(&self) -> &'static str {
        "lru"
    }
}

// == LFU ==
/// Least Frequently Used: lowest access count goes first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lfu;

impl<K, V> EvictionPolicy<K, V> for Lfu
where
    K: Eq + Hash + Clone + Send + Sync,
{
    fn select_victims(&self, entries: &HashMap<K, CacheEntry<V>>, max_size: usize) -> Vec<K> {
        lowest_ranked(entries, max_size, |entry| entry.access_count)
    }

    fn name(&self) -> &'static str {
        "lfu"
    }
}

// == Eviction Kind ==
/// Built-in policy selector, parseable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionKind {
    #[default]
    Lru,
    Lfu,
}

impl EvictionKind {
    /// Boxes the matching policy for use by a cache.
    pub fn into_policy<K, V>(self) -> Box<dyn EvictionPolicy<K, V>>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: 'static,
    {
        match self {
            EvictionKind::Lru => Box::new(Lru),
            EvictionKind::Lfu => Box::new(Lfu),
        }
    }
}

impl fmt::Display for EvictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionKind::Lru => f.write_str("lru"),
            EvictionKind::Lfu => f.write_str("lfu"),
        }
    }
}

impl FromStr for EvictionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(EvictionKind::Lru),
            "lfu" => Ok(EvictionKind::Lfu),
            other => Err(format!("unknown eviction policy '{}'", other)),
        }
    }
}
