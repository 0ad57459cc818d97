//! Eviction Module
//!
//! Batched least-recently-used victim selection. Runs only when the store is
//! over its soft limits, so a full sort is acceptable here.

use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Constants ==
/// Fraction of the store removed by one eviction pass
pub const EVICTION_FRACTION: f64 = 0.10;

// == Batch Size ==
/// Number of entries one eviction pass removes from a store of `len`.
///
/// Always at least one when the store is non-empty.
pub fn eviction_batch_size(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    ((len as f64 * EVICTION_FRACTION).floor() as usize).max(1)
}

// == Select Victims ==
/// Returns the keys of the least recently accessed entries, oldest first.
pub fn select_lru_victims(entries: &HashMap<String, CacheEntry>) -> Vec<String> {
    let count = eviction_batch_size(entries.len());

    let mut by_recency: Vec<&CacheEntry> = entries.values().collect();
    by_recency.sort_by(|a, b| {
        a.last_accessed
            .cmp(&b.last_accessed)
            .then(a.access_seq.cmp(&b.access_seq))
    });

    by_recency
        .into_iter()
        .take(count)
        .map(|entry| entry.key.clone())
        .collect()
}
