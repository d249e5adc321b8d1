//! Response DTOs for the cache service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::distributed::{DistributedStats, HealthReport};

/// Which tier answered a read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheTier {
    Local,
    Distributed,
}

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
    pub source: CacheTier,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: impl Into<String>, source: CacheTier) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            source,
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// Whether the distributed tier accepted the write
    pub replicated: bool,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, replicated: bool) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            replicated,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for key derivation (POST /keys)
#[derive(Debug, Clone, Serialize)]
pub struct DeriveKeyResponse {
    pub key: String,
}

/// Response body for namespace invalidation (DELETE /namespace/:prefix)
#[derive(Debug, Clone, Serialize)]
pub struct ClearNamespaceResponse {
    pub prefix: String,
    /// Distributed entries removed
    pub removed: usize,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Bounded cache snapshot
    pub local: CacheStats,
    /// Hit rate of the bounded cache (hits / (hits + misses))
    pub hit_rate: f64,
    /// Distributed tier telemetry
    pub distributed: DistributedStats,
}

impl StatsResponse {
    pub fn new(local: CacheStats, distributed: DistributedStats) -> Self {
        Self {
            hit_rate: local.hit_rate(),
            local,
            distributed,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status; the distributed tier reports separately
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub distributed: HealthReport,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(distributed: HealthReport) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            distributed,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
