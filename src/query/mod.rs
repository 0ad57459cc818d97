//! Query Module
//!
//! Public facade over the cache store: get-or-compute, invalidation,
//! analytics helpers and warmup.

pub mod analytics;
mod cache;
mod warmup;

pub use analytics::{AnalyticsDataType, DateRange};
pub use cache::{CacheOptions, QueryCache, KEY_PREFIX};
pub use warmup::{WarmupEntry, WarmupFuture, WarmupReport};
