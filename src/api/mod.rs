//! API Module
//!
//! HTTP handlers and routing for the cache's admin surface.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache statistics
//! - `POST /invalidate` - Tag-based invalidation
//! - `DELETE /tenants/:tenant_id/analytics[/:data_type]` - Tenant invalidation
//! - `DELETE /cache` - Clear the cache

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
