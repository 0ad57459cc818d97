//! Cache Statistics Module
//!
//! Tracks hit/miss counters, maintenance counters and the running average
//! response time of cache lookups.

use std::time::Duration;

use serde::Serialize;

// == Cache Stats ==
/// Mutable counters owned by the store.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that required a computation
    pub misses: u64,
    /// Entries removed by LRU eviction
    pub evictions: u64,
    /// Entries removed because their TTL elapsed
    pub expirations: u64,
    /// Entries removed by tag invalidation or explicit delete
    pub invalidations: u64,
    /// Sum of measured response times
    total_response_time: Duration,
    /// Number of measured operations
    operations: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Counts a hit and folds its response time into the average.
    pub fn record_hit(&mut self, elapsed: Duration) {
        self.hits += 1;
        self.record_response_time(elapsed);
    }

    // == Record Miss ==
    /// Counts a miss and folds its response time into the average.
    pub fn record_miss(&mut self, elapsed: Duration) {
        self.misses += 1;
        self.record_response_time(elapsed);
    }

    fn record_response_time(&mut self, elapsed: Duration) {
        self.total_response_time += elapsed;
        self.operations += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn record_invalidations(&mut self, count: usize) {
        self.invalidations += count as u64;
    }

    // == Rates ==
    /// Hit rate as a percentage of all lookups, 0 when nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }

    /// Miss rate as a percentage of all lookups, 0 when nothing was looked up.
    pub fn miss_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.misses as f64 / total as f64 * 100.0
        }
    }

    // == Average Response Time ==
    /// Mean response time in milliseconds.
    pub fn average_response_time_ms(&self) -> f64 {
        if self.operations == 0 {
            0.0
        } else {
            self.total_response_time.as_secs_f64() * 1000.0 / self.operations as f64
        }
    }

    // == Snapshot ==
    /// Freezes the counters together with the store's size figures.
    pub fn snapshot(
        &self,
        total_entries: usize,
        memory_usage_bytes: usize,
        tag_count: usize,
    ) -> StatsSnapshot {
        StatsSnapshot {
            total_hits: self.hits,
            total_misses: self.misses,
            hit_rate: self.hit_rate(),
            miss_rate: self.miss_rate(),
            total_entries,
            memory_usage_bytes,
            tag_count,
            evictions: self.evictions,
            expirations: self.expirations,
            invalidations: self.invalidations,
            average_response_time_ms: self.average_response_time_ms(),
        }
    }
}

// == Stats Snapshot ==
/// Read-only view returned by `get_stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total_hits: u64,
    pub total_misses: u64,
    /// Percentage, 0..=100
    pub hit_rate: f64,
    /// Percentage, 0..=100
    pub miss_rate: f64,
    pub total_entries: usize,
    /// Heuristic estimate, see `entry::estimate_size`
    pub memory_usage_bytes: usize,
    pub tag_count: usize,
    pub evictions: u64,
    pub expirations: u64,
    pub invalidations: u64,
    pub average_response_time_ms: f64,
}
