//! Request DTOs for the cache service API
//!
//! Incoming bodies check themselves and convert into the values the cache
//! tiers take, so handlers stay thin.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::CacheError;
use crate::keys::CacheKey;

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

fn check_key(key: &str) -> Result<(), CacheError> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

/// Body of `PUT /set`. Written to both cache tiers.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: String,
    /// Seconds; each tier falls back to its own default when absent
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Checks the key and returns the TTL both tiers should apply.
    pub fn validated_ttl(&self) -> Result<Option<Duration>, CacheError> {
        check_key(&self.key)?;
        match self.ttl {
            Some(0) => Err(CacheError::InvalidRequest(
                "TTL must be at least 1 second".to_string(),
            )),
            ttl => Ok(ttl.map(Duration::from_secs)),
        }
    }
}

/// Body of `POST /keys`: the inputs of a derived cache key.
#[derive(Debug, Clone, Deserialize)]
pub struct DeriveKeyRequest {
    pub namespace: String,
    /// Any JSON value; objects are hashed field by field
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub qualifiers: Map<String, Value>,
}

impl DeriveKeyRequest {
    pub fn into_cache_key(self) -> Result<CacheKey, CacheError> {
        let key = CacheKey::new(self.namespace).params(&self.params)?;
        Ok(self
            .qualifiers
            .into_iter()
            .fold(key, |key, (name, value)| key.qualifier(name, value)))
    }
}
