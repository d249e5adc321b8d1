//! Error types for the caching and pooling layer
//!
//! Provides unified error handling using thiserror. Cache misses are never
//! errors; they surface as `None`.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Errors surfaced by the HTTP service.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<KeyError> for CacheError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::EmptyNamespace => CacheError::InvalidRequest(err.to_string()),
            KeyError::Serialization(_) => CacheError::Internal(err.to_string()),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Pool Error Enum ==
/// Failures returned by `ResourcePool::acquire` and construction.
#[derive(Error, Debug)]
pub enum PoolError {
    /// No resource became available before the timeout elapsed
    #[error("Resource pool exhausted: no resource available within {0:?}")]
    Exhausted(Duration),

    /// The factory failed to build a resource
    #[error("Failed to create pooled resource: {0}")]
    Creation(#[source] anyhow::Error),

    /// `close_all` has been called
    #[error("Resource pool is closed")]
    Closed,

    /// Bounds rejected at construction time
    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),
}

// == Store Error Enum ==
/// Failures reported by an external key-value client.
///
/// The distributed facade swallows every one of these.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend cannot be reached
    #[error("Key-value store unavailable: {0}")]
    Unavailable(String),

    /// Stored payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other backend failure
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

// == Key Error Enum ==
/// Failure to turn request parameters into canonical key material.
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Cache key namespace cannot be empty")]
    EmptyNamespace,

    #[error("Parameters cannot be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Aliases ==
/// Convenience Result type for the HTTP service.
pub type Result<T> = std::result::Result<T, CacheError>;

pub type PoolResult<T> = std::result::Result<T, PoolError>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;
