//! API Handlers
//!
//! HTTP request handlers for inspecting and invalidating a running session.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{CacheError, Result};
use crate::instance::InstanceKey;
use crate::models::{
    CacheEntryResponse, ClearResponse, HealthResponse, InstanceClearResponse, InstanceResponse,
    SetCacheRequest, SetResponse, StatsResponse,
};
use crate::session::Session;

/// Application state shared across all handlers.
///
/// The session is internally shared, so cloning the state is cheap.
#[derive(Clone)]
pub struct AppState {
    pub session: Session,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Creates a new AppState with a fresh session built from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(Session::new(config))
    }
}

/// Handler for GET /cache/:key
///
/// Peeks at an entry; the access counter is not incremented.
pub async fn get_cache_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<CacheEntryResponse>> {
    let cache = state.session.cache_store().read().await;
    let entry = cache
        .entry(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(CacheEntryResponse::new(key.clone(), entry)))
}

/// Handler for PUT /cache
pub async fn set_cache_handler(
    State(state): State<AppState>,
    Json(req): Json<SetCacheRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state
        .session
        .cache_store()
        .write()
        .await
        .set(req.key.clone(), req.value);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for DELETE /cache/:key
pub async fn clear_cache_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ClearResponse>> {
    if state.session.clear_cache(Some(&key)).await {
        Ok(Json(ClearResponse::key(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.session.clear_cache(None).await;
    Json(ClearResponse::all())
}

/// Handler for GET /instance
pub async fn instance_handler(State(state): State<AppState>) -> Json<InstanceResponse> {
    Json(InstanceResponse {
        entries: state.session.instance().await,
    })
}

/// Handler for DELETE /instance/:key
///
/// Unknown key names are rejected; a known but unset key clears nothing.
pub async fn clear_instance_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<InstanceClearResponse>> {
    let key: InstanceKey = key.parse()?;
    let cleared = if state.session.clear_instance_data(key).await {
        vec![key]
    } else {
        Vec::new()
    };

    Ok(Json(InstanceClearResponse { cleared }))
}

/// Handler for DELETE /instance
///
/// Same effect as an in-place navigation.
pub async fn navigate_handler(State(state): State<AppState>) -> Json<InstanceClearResponse> {
    Json(InstanceClearResponse {
        cleared: state.session.navigate().await,
    })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.session.stats().await))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
