//! Cache Record Module
//!
//! The payload written to the external store: the serialized value plus the
//! metadata the facade needs to track it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Record ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub value: Value,
    pub cached_at: DateTime<Utc>,
    /// TTL in seconds the record was written with
    pub ttl: u64,
    pub access_count: u64,
}

impl CacheRecord {
    pub fn new(value: Value, ttl: Duration) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
            ttl: ttl.as_secs(),
            access_count: 0,
        }
    }

    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
