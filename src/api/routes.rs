//! API Routes
//!
//! Wires the handlers into one Axum router. Cache traffic and operational
//! endpoints are declared separately and merged under shared middleware.

use axum::{
    http::Method,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_namespace_handler, delete_handler, derive_key_handler, get_handler, health_handler,
    set_handler, stats_handler, AppState,
};

/// Builds the service router.
///
/// Every request is traced; CORS admits any origin for the methods the
/// cache routes use.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(cache_routes())
        .merge(ops_routes())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// == Route Groups ==

/// Reads, writes and invalidation across both tiers.
fn cache_routes() -> Router<AppState> {
    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/keys", post(derive_key_handler))
        .route("/namespace/:prefix", delete(clear_namespace_handler))
}

fn ops_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT, Method::POST, Method::DELETE])
        .allow_headers(Any)
}
