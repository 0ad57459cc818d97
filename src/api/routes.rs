//! API Routes
//!
//! Configures the Axum router with the cache's admin endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, health_handler, invalidate_handler, invalidate_tenant_data_type_handler,
    invalidate_tenant_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check
/// - `GET /stats` - Cache statistics snapshot
/// - `POST /invalidate` - Invalidate entries by tag
/// - `DELETE /tenants/:tenant_id/analytics` - Invalidate a tenant's analytics
/// - `DELETE /tenants/:tenant_id/analytics/:data_type` - Invalidate one data type of a tenant
/// - `DELETE /cache` - Clear every entry
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/invalidate", post(invalidate_handler))
        .route("/tenants/:tenant_id/analytics", delete(invalidate_tenant_handler))
        .route(
            "/tenants/:tenant_id/analytics/:data_type",
            delete(invalidate_tenant_data_type_handler),
        )
        .route("/cache", delete(clear_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
