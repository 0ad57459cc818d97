//! Query Cache - An in-process memoization layer for tenant-scoped queries
//!
//! Provides get-or-compute caching with TTL expiration, tag-based group
//! invalidation, batched LRU eviction under soft limits and hit/miss
//! statistics.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::CacheError;
pub use query::{AnalyticsDataType, CacheOptions, DateRange, QueryCache, WarmupEntry};
pub use tasks::spawn_cleanup_task;
