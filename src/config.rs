//! Configuration Module
//!
//! Handles loading and managing configuration from environment variables.
//! Library types take these structs through their constructors; nothing is
//! read from the environment implicitly.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::EvictionKind;

/// Reads and parses an environment variable, falling back to `default`.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the bounded cache can hold
    pub max_entries: usize,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// Eviction policy for the bounded cache
    pub eviction_policy: EvictionKind,
    /// HTTP server port
    pub server_port: u16,
    /// Background expiry sweep interval in seconds, 0 disables the sweep
    pub cleanup_interval: u64,
    pub distributed: DistributedConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `EVICTION_POLICY` - `lru` or `lfu` (default: lru)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 1)
    /// - see [`DistributedConfig::from_env`]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            eviction_policy: env_or("EVICTION_POLICY", defaults.eviction_policy),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            distributed: DistributedConfig::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: 300,
            eviction_policy: EvictionKind::Lru,
            server_port: 3000,
            cleanup_interval: 1,
            distributed: DistributedConfig::default(),
        }
    }
}

// == Pool Config ==
/// Bounds and timings for a `ResourcePool`.
///
/// The service itself runs no pool; embedding applications build one from
/// this, usually via [`PoolConfig::from_env`].
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Resources kept alive even when idle
    pub min_size: usize,
    /// Hard cap on live resources, in use or not
    pub max_size: usize,
    /// Idle time after which an available resource may be reaped
    pub max_idle_time: Duration,
    /// Timeout used by `acquire_default`
    pub acquire_timeout: Duration,
    /// Upper bound on the sleep between acquire retries
    pub poll_interval: Duration,
}

impl PoolConfig {
    pub fn new(min_size: usize, max_size: usize) -> Self {
        Self {
            min_size,
            max_size,
            ..Self::default()
        }
    }

    pub fn with_max_idle_time(mut self, max_idle_time: Duration) -> Self {
        self.max_idle_time = max_idle_time;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// # Environment Variables
    /// - `POOL_MIN_SIZE` (default: 1)
    /// - `POOL_MAX_SIZE` (default: 10)
    /// - `POOL_MAX_IDLE_SECS` (default: 300)
    /// - `POOL_ACQUIRE_TIMEOUT_MS` (default: 5000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_size: env_or("POOL_MIN_SIZE", defaults.min_size),
            max_size: env_or("POOL_MAX_SIZE", defaults.max_size),
            max_idle_time: Duration::from_secs(env_or(
                "POOL_MAX_IDLE_SECS",
                defaults.max_idle_time.as_secs(),
            )),
            acquire_timeout: Duration::from_millis(env_or(
                "POOL_ACQUIRE_TIMEOUT_MS",
                defaults.acquire_timeout.as_millis() as u64,
            )),
            poll_interval: defaults.poll_interval,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_size: 1,
            max_size: 10,
            max_idle_time: Duration::from_secs(300),
            acquire_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(10),
        }
    }
}

// == Distributed Config ==
/// Settings for the distributed cache facade.
#[derive(Debug, Clone)]
pub struct DistributedConfig {
    /// Root prefix of every key the facade writes
    pub namespace: String,
    /// TTL used when callers do not pass one
    pub default_ttl: Duration,
    /// Capacity of the access-count update queue
    pub access_queue_capacity: usize,
}

impl DistributedConfig {
    /// # Environment Variables
    /// - `DISTRIBUTED_NAMESPACE` (default: cache)
    /// - `DISTRIBUTED_DEFAULT_TTL` - seconds (default: 3600)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            namespace: env_or("DISTRIBUTED_NAMESPACE", defaults.namespace),
            default_ttl: Duration::from_secs(env_or(
                "DISTRIBUTED_DEFAULT_TTL",
                defaults.default_ttl.as_secs(),
            )),
            access_queue_capacity: defaults.access_queue_capacity,
        }
    }
}

impl Default for DistributedConfig {
    fn default() -> Self {
        Self {
            namespace: "cache".to_string(),
            default_ttl: Duration::from_secs(3600),
            access_queue_capacity: 1024,
        }
    }
}
