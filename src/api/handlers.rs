//! API Handlers
//!
//! HTTP request handlers for the cache's admin surface: observability and
//! externally delivered invalidation signals.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::StatsSnapshot;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{ClearResponse, HealthResponse, InvalidateRequest, InvalidateResponse};
use crate::query::{AnalyticsDataType, QueryCache};

/// Application state shared across all handlers.
///
/// Owns the process-lifetime cache instance.
#[derive(Clone)]
pub struct AppState {
    pub cache: QueryCache,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration, starting the expiration
    /// sweep. Must be called from within a tokio runtime.
    pub fn from_config(config: &Config) -> Self {
        Self::new(QueryCache::init(config))
    }
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.cache.get_stats().await)
}

/// Handler for POST /invalidate
///
/// Removes every entry carrying any of the given tags.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let invalidated = state.cache.invalidate_by_tags(&req.tags).await;
    Ok(Json(InvalidateResponse::new(invalidated)))
}

/// Handler for DELETE /tenants/:tenant_id/analytics
pub async fn invalidate_tenant_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Json<InvalidateResponse> {
    let invalidated = state.cache.invalidate_tenant_analytics(&tenant_id).await;
    Json(InvalidateResponse::new(invalidated))
}

/// Handler for DELETE /tenants/:tenant_id/analytics/:data_type
pub async fn invalidate_tenant_data_type_handler(
    State(state): State<AppState>,
    Path((tenant_id, data_type)): Path<(String, String)>,
) -> Result<Json<InvalidateResponse>> {
    let data_type: AnalyticsDataType = data_type.parse()?;
    let invalidated = state
        .cache
        .invalidate_tenant_data_type(&tenant_id, data_type)
        .await;
    Ok(Json(InvalidateResponse::new(invalidated)))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    Json(ClearResponse::new(state.cache.clear().await))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
