//! Cache Module
//!
//! In-memory entry store with TTL expiration, tag-based invalidation and
//! batched LRU eviction under soft limits.

mod entry;
pub mod eviction;
mod stats;
mod store;
mod tags;


// Re-export public types
pub use entry::{estimate_size, CacheEntry, ENTRY_OVERHEAD_BYTES};
pub use stats::{CacheStats, StatsSnapshot};
pub use store::CacheStore;
pub use tags::TagIndex;
