//! Cache Key Derivation
//!
//! Turns a namespace plus structured request parameters into a stable,
//! compact cache key. Parameters are canonicalized (object keys sorted at
//! every depth) before hashing, so logically identical requests map to the
//! same key regardless of how they were built.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::KeyError;

/// Hex characters of the SHA-256 digest kept in a key.
pub const DIGEST_LEN: usize = 32;

// == Derive ==
/// Derives `"{namespace}:{digest}"` from `params`.
///
/// `params` may be any serializable value. Maps and structs are hashed by
/// field name, so insertion order never matters.
///
/// # Example
/// ```
/// use serde_json::json;
///
/// let a = cachepool::keys::derive("models", &json!({"x": 1, "y": 2})).unwrap();
/// let b = cachepool::keys::derive("models", &json!({"y": 2, "x": 1})).unwrap();
/// assert_eq!(a, b);
/// assert!(a.starts_with("models:"));
/// ```
pub fn derive<P>(namespace: &str, params: &P) -> Result<String, KeyError>
where
    P: Serialize + ?Sized,
{
    CacheKey::new(namespace).params(params)?.derive()
}

// == Cache Key Builder ==
/// Accumulates parameters and qualifiers for one cache key.
///
/// Qualifiers (requester role, algorithm variant, ...) live next to the
/// parameters inside the hashed structure rather than being appended to the
/// key text.
#[derive(Debug, Clone)]
pub struct CacheKey {
    namespace: String,
    params: Map<String, Value>,
    qualifiers: Map<String, Value>,
}

impl CacheKey {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            params: Map::new(),
            qualifiers: Map::new(),
        }
    }

    /// Adds one parameter. A later value for the same name replaces the earlier one.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Merges every field of a serializable value into the parameters.
    ///
    /// Non-object values are stored under the `"value"` parameter.
    pub fn params<P>(mut self, params: &P) -> Result<Self, KeyError>
    where
        P: Serialize + ?Sized,
    {
        match serde_json::to_value(params)? {
            Value::Object(map) => self.params.extend(map),
            Value::Null => {}
            other => {
                self.params.insert("value".to_string(), other);
            }
        }
        Ok(self)
    }

    /// Adds a disambiguating field that is hashed alongside the parameters.
    pub fn qualifier(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.qualifiers.insert(name.into(), value.into());
        self
    }

    /// Hashes the canonical form and returns the finished key.
    pub fn derive(self) -> Result<String, KeyError> {
        if self.namespace.trim().is_empty() {
            return Err(KeyError::EmptyNamespace);
        }

        let mut material = Map::new();
        material.insert("namespace".to_string(), Value::String(self.namespace.clone()));
        material.insert("params".to_string(), Value::Object(self.params));
        if !self.qualifiers.is_empty() {
            material.insert("qualifiers".to_string(), Value::Object(self.qualifiers));
        }

        let bytes = serde_json::to_vec(&canonicalize(Value::Object(material)))?;
        let digest = format!("{:x}", Sha256::digest(&bytes));

        Ok(format!("{}:{}", self.namespace, &digest[..DIGEST_LEN]))
    }
}

// == Canonicalize ==
/// Rebuilds `value` with every object's keys in lexicographic order.
///
/// Does not depend on serde_json's map ordering feature.
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
