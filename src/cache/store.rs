//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with the tag index, batched
//! LRU eviction and TTL expiration.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::eviction::select_lru_victims;
use crate::cache::{CacheEntry, CacheStats, StatsSnapshot, TagIndex};
use crate::config::Config;

// == Cache Store ==
/// Entry storage with tag index, soft limits and statistics.
///
/// Every removal path goes through `remove_entry`, which drops the entry and
/// its tag memberships together.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Tag to keys reverse index
    tags: TagIndex,
    /// Performance statistics
    stats: CacheStats,
    /// Soft cap on the number of entries
    max_entries: usize,
    /// Soft cap on the estimated memory usage in bytes
    memory_limit: usize,
    /// Running sum of entry size estimates
    memory_used: usize,
    /// Monotonic access counter
    access_seq: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with the given soft limits.
    ///
    /// # Arguments
    /// * `max_entries` - Entry count above which LRU eviction runs
    /// * `memory_limit` - Estimated bytes above which LRU eviction runs
    pub fn new(max_entries: usize, memory_limit: usize) -> Self {
        Self {
            entries: HashMap::new(),
            tags: TagIndex::new(),
            stats: CacheStats::new(),
            max_entries,
            memory_limit,
            memory_used: 0,
            access_seq: 0,
        }
    }

    /// Creates a store sized from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_entries, config.memory_limit_bytes)
    }

    fn next_seq(&mut self) -> u64 {
        self.access_seq += 1;
        self.access_seq
    }

    // == Set ==
    /// Inserts or replaces an entry.
    ///
    /// A replaced entry leaves every tag it held before the new tags are
    /// registered. If the store ends up over either soft limit, one LRU
    /// eviction pass runs before returning.
    pub fn set(&mut self, key: String, data: Value, ttl: Duration, tags: HashSet<String>) {
        self.remove_entry(&key);

        let mut entry = CacheEntry::new(key.clone(), data, ttl, tags);
        entry.access_seq = self.next_seq();

        if entry.size_bytes > self.memory_limit {
            warn!(
                key = %key,
                size_bytes = entry.size_bytes,
                memory_limit = self.memory_limit,
                "Entry alone exceeds the memory limit"
            );
        }

        self.tags.register(&key, &entry.tags);
        self.memory_used += entry.size_bytes;
        self.entries.insert(key, entry);

        if self.is_over_limit() {
            self.evict_lru();
        }
    }

    // == Get ==
    /// Returns the value of a live entry and records the access.
    ///
    /// An expired entry is removed on the spot and reported as absent.
    /// Hit/miss counters are left to the caller, which also measures the
    /// response time.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let expired = self.entries.get(key)?.is_expired();

        if expired {
            self.remove_entry(key);
            self.stats.record_expirations(1);
            debug!(key, "Dropped expired entry on lookup");
            return None;
        }

        let seq = self.next_seq();
        let entry = self.entries.get_mut(key)?;
        entry.touch(seq);
        Some(entry.data.clone())
    }

    // == Peek ==
    /// Returns a live entry without touching access metadata.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key).filter(|entry| !entry.is_expired())
    }

    // == Remove ==
    /// Removes a single entry, counting it as an invalidation.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.remove_entry(key).is_some();
        if removed {
            self.stats.record_invalidations(1);
        }
        removed
    }

    /// Removes a single entry without counting an invalidation.
    ///
    /// For entries dropped because they are unusable, not because a caller
    /// asked for them to go.
    pub fn discard(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.tags.unregister(key, &entry.tags);
        self.memory_used = self.memory_used.saturating_sub(entry.size_bytes);
        Some(entry)
    }

    // == Invalidate By Tags ==
    /// Removes every entry carrying any of the given tags.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_by_tags<S: AsRef<str>>(&mut self, tags: &[S]) -> usize {
        let mut count = 0;
        for key in self.tags.keys_for(tags) {
            if self.remove_entry(&key).is_some() {
                count += 1;
            }
        }

        self.stats.record_invalidations(count);
        count
    }

    /// Removes every entry carrying all of the given tags.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_by_all_tags<S: AsRef<str>>(&mut self, tags: &[S]) -> usize {
        let mut count = 0;
        for key in self.tags.keys_for_all(tags) {
            if self.remove_entry(&key).is_some() {
                count += 1;
            }
        }

        self.stats.record_invalidations(count);
        count
    }

    // == Evict LRU ==
    /// Removes the least recently accessed 10% of entries (at least one).
    ///
    /// Returns the number of entries evicted.
    pub fn evict_lru(&mut self) -> usize {
        let mut count = 0;
        for key in select_lru_victims(&self.entries) {
            if self.remove_entry(&key).is_some() {
                count += 1;
            }
        }

        self.stats.record_evictions(count);
        debug!(
            evicted = count,
            remaining = self.entries.len(),
            "LRU eviction pass"
        );
        count
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            self.remove_entry(&key);
        }

        self.stats.record_expirations(count);
        count
    }

    // == Clear ==
    /// Drops every entry and tag, keeping the statistics.
    ///
    /// Returns the number of entries removed.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.tags.clear();
        self.memory_used = 0;
        self.stats.record_invalidations(count);
        count
    }

    // == Reset ==
    /// Drops every entry, tag and counter.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.tags.clear();
        self.memory_used = 0;
        self.access_seq = 0;
        self.stats = CacheStats::new();
    }

    // == Statistics ==
    /// Counts a hit that took `elapsed` to serve.
    pub fn record_hit(&mut self, elapsed: Duration) {
        self.stats.record_hit(elapsed);
    }

    /// Counts a miss that took `elapsed` to serve, computation included.
    pub fn record_miss(&mut self, elapsed: Duration) {
        self.stats.record_miss(elapsed);
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats
            .snapshot(self.entries.len(), self.memory_used, self.tags.len())
    }

    // == Accessors ==
    fn is_over_limit(&self) -> bool {
        self.entries.len() > self.max_entries || self.memory_used > self.memory_limit
    }

    /// Returns the current number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Estimated memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        self.memory_used
    }

    /// True if an entry, live or expired, is physically present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn tag_index(&self) -> &TagIndex {
        &self.tags
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }
}
