//! Cache Entry Module
//!
//! Defines a single memoized query result together with its TTL, tags and
//! access metadata.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde_json::Value;

// == Constants ==
/// Fixed bookkeeping overhead added to every entry's size estimate
pub const ENTRY_OVERHEAD_BYTES: usize = 64;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Fully-qualified cache key
    pub key: String,
    /// The memoized value
    pub data: Value,
    /// Creation/refresh instant
    pub timestamp: Instant,
    /// Duration after which the entry is stale
    pub ttl: Duration,
    /// Group invalidation labels
    pub tags: HashSet<String>,
    /// Number of hits served by this entry
    pub access_count: u64,
    /// Instant of the most recent hit (or creation)
    pub last_accessed: Instant,
    /// Monotonic access sequence, breaks ties between equal instants
    pub(crate) access_seq: u64,
    /// Estimated memory footprint in bytes
    pub size_bytes: usize,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry, computing its size estimate up front.
    pub fn new(key: String, data: Value, ttl: Duration, tags: HashSet<String>) -> Self {
        let now = Instant::now();
        let size_bytes = estimate_size(&key, &data, &tags);

        Self {
            key,
            data,
            timestamp: now,
            ttl,
            tags,
            access_count: 0,
            last_accessed: now,
            access_seq: 0,
            size_bytes,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once its age is greater than or equal to its TTL,
    /// so a zero TTL entry is expired immediately.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a fixed instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.timestamp) >= self.ttl
    }

    // == Age ==
    /// Time elapsed since the entry was created.
    pub fn age(&self) -> Duration {
        self.timestamp.elapsed()
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.ttl.saturating_sub(self.age())
    }

    // == Touch ==
    /// Records a hit against this entry.
    pub fn touch(&mut self, seq: u64) {
        self.access_count += 1;
        self.last_accessed = Instant::now();
        self.access_seq = seq;
    }
}

// == Size Estimation ==
/// Approximates the footprint of an entry.
///
/// Strings are counted as UTF-16 code units times two; the value is
/// measured through its JSON serialization.
pub fn estimate_size(key: &str, data: &Value, tags: &HashSet<String>) -> usize {
    let value_units = data.to_string().encode_utf16().count();
    let key_units = key.encode_utf16().count();
    let tag_units: usize = tags.iter().map(|t| t.encode_utf16().count()).sum();

    (value_units + key_units + tag_units) * 2 + ENTRY_OVERHEAD_BYTES
}
