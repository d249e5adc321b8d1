//! API Module
//!
//! HTTP handlers and routing for the two-tier cache service REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key from both tiers
//! - `POST /keys` - Derive a cache key from a namespace and parameters
//! - `DELETE /namespace/:prefix` - Invalidate distributed entries under a prefix
//! - `GET /stats` - Local and distributed statistics
//! - `GET /health` - Health check with distributed tier report

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
