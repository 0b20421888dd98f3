//! API Routes
//!
//! Configures the Axum router with all diagnostics endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, clear_cache_key_handler, clear_instance_key_handler, get_cache_handler,
    health_handler, instance_handler, navigate_handler, set_cache_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check
/// - `GET /stats` - Cache, queue and registry statistics
/// - `PUT /cache` - Seed a cache entry
/// - `DELETE /cache` - Clear the whole cache
/// - `GET /cache/:key` - Peek at an entry
/// - `DELETE /cache/:key` - Clear one entry
/// - `GET /instance` - Instance registry snapshot
/// - `DELETE /instance` - Clear page-scoped instance data
/// - `DELETE /instance/:key` - Clear one instance key
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/cache", delete(clear_cache_handler).put(set_cache_handler))
        .route(
            "/cache/:key",
            get(get_cache_handler).delete(clear_cache_key_handler),
        )
        .route("/instance", get(instance_handler).delete(navigate_handler))
        .route("/instance/:key", delete(clear_instance_key_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
