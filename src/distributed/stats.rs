//! Distributed Cache Telemetry
//!
//! Process-lifetime hit/miss counters and the derived health snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Below this many entries the cache is considered implausibly small.
pub const SMALL_CACHE_ENTRIES: usize = 10;
/// Above this many entries the cache is considered very large.
pub const LARGE_CACHE_ENTRIES: usize = 10_000;

/// Hit rate under which request parameters are suspected to be unstable.
pub const LOW_HIT_RATE: f64 = 0.4;
/// Hit rate under which the cache is considered underperforming.
pub const TARGET_HIT_RATE: f64 = 0.7;

// == Counters ==
#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    requests: AtomicU64,
}

impl Counters {
    pub(crate) fn record_hit(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, cache_size: usize) -> DistributedStats {
        let hit_count = self.hits.load(Ordering::Relaxed);
        let miss_count = self.misses.load(Ordering::Relaxed);
        let total_requests = self.requests.load(Ordering::Relaxed);
        let hit_rate = if total_requests == 0 {
            0.0
        } else {
            hit_count as f64 / total_requests as f64
        };

        DistributedStats {
            hit_rate,
            hit_count,
            miss_count,
            total_requests,
            cache_size,
            health_score: hit_rate * size_factor(cache_size),
        }
    }
}

/// Penalty applied to the hit rate for caches of implausible size.
pub fn size_factor(cache_size: usize) -> f64 {
    if cache_size < SMALL_CACHE_ENTRIES {
        0.8
    } else if cache_size > LARGE_CACHE_ENTRIES {
        0.9
    } else {
        1.0
    }
}

// == Distributed Stats ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributedStats {
    pub hit_rate: f64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub total_requests: u64,
    pub cache_size: usize,
    pub health_score: f64,
}

// == Health Report ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
    /// The external store could not be reached
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub hit_rate: f64,
    pub health_score: f64,
    pub cache_size: usize,
    pub recommendations: Vec<String>,
}

impl HealthReport {
    /// Builds the report from a stats snapshot. `reachable` is false when the
    /// store failed to answer the size probe.
    pub fn evaluate(stats: &DistributedStats, reachable: bool) -> Self {
        let mut recommendations = Vec::new();

        let status = if !reachable {
            recommendations.push("check connectivity to the external key-value store".to_string());
            HealthStatus::Unavailable
        } else if stats.total_requests == 0 {
            HealthStatus::Healthy
        } else {
            if stats.hit_rate < LOW_HIT_RATE {
                recommendations.push(
                    "check whether request parameters are consistent before hashing".to_string(),
                );
            } else if stats.hit_rate < TARGET_HIT_RATE {
                recommendations.push(
                    "consider longer TTLs or preloading frequently requested keys".to_string(),
                );
            }

            if stats.health_score >= TARGET_HIT_RATE {
                HealthStatus::Healthy
            } else if stats.health_score >= LOW_HIT_RATE {
                HealthStatus::Degraded
            } else {
                HealthStatus::Critical
            }
        };

        if reachable && stats.cache_size > LARGE_CACHE_ENTRIES {
            recommendations.push(
                "cache is very large; consider shorter TTLs or clearing stale namespaces"
                    .to_string(),
            );
        }
        if reachable && stats.cache_size < SMALL_CACHE_ENTRIES && stats.total_requests >= 100 {
            recommendations.push(
                "cache holds very few entries; verify writes succeed and TTLs are not too short"
                    .to_string(),
            );
        }

        Self {
            status,
            hit_rate: stats.hit_rate,
            health_score: stats.health_score,
            cache_size: stats.cache_size,
            recommendations,
        }
    }
}
