//! Query Cache Facade
//!
//! The get-or-compute entry point placed in front of expensive queries.

use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, StatsSnapshot};
use crate::config::Config;
use crate::error::Result;
use crate::tasks::spawn_cleanup_task;

// == Constants ==
/// Namespace prepended to every caller key
pub const KEY_PREFIX: &str = "query_cache:";

// == Cache Options ==
/// Per-call TTL and tags.
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// Overrides the configured default TTL
    pub ttl: Option<Duration>,
    /// Labels for group invalidation
    pub tags: Vec<String>,
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }
}

// == Query Cache ==
/// Owned, cheaply clonable handle to one process-local cache.
///
/// Clones share the same store. Construct one per application and inject it
/// where needed; `shutdown` ends its lifecycle.
#[derive(Debug, Clone)]
pub struct QueryCache {
    store: Arc<RwLock<CacheStore>>,
    default_ttl: Duration,
    cleanup: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl QueryCache {
    // == Constructors ==
    /// Creates a cache without a background sweep.
    pub fn new(config: &Config) -> Self {
        Self {
            store: Arc::new(RwLock::new(CacheStore::from_config(config))),
            default_ttl: config.default_ttl(),
            cleanup: Arc::new(Mutex::new(None)),
        }
    }

    /// Creates a cache and starts its expiration sweep.
    ///
    /// Must be called from within a tokio runtime.
    pub fn init(config: &Config) -> Self {
        let cache = Self::new(config);
        cache.start_cleanup(config.cleanup_interval());
        info!(
            max_entries = config.max_entries,
            default_ttl_ms = config.default_ttl_ms,
            memory_limit_bytes = config.memory_limit_bytes,
            "Query cache initialized"
        );
        cache
    }

    /// Starts (or restarts) the background expiration sweep.
    pub fn start_cleanup(&self, interval: Duration) {
        let handle = spawn_cleanup_task(self.store.clone(), interval);
        let mut slot = self.cleanup.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    fn full_key(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }

    // == Get ==
    /// Returns the cached value for `key`, computing and storing it on a miss.
    ///
    /// A failed computation is returned unchanged and nothing is cached, as is
    /// a value whose JSON form does not deserialize back into `T` (`f64::NAN`
    /// for instance). Concurrent misses on the same key each run `compute`;
    /// the last store wins.
    ///
    /// A value whose size estimate alone exceeds the memory limit is stored
    /// and may be evicted by the same insert.
    pub async fn get<T, F, Fut, E>(
        &self,
        key: &str,
        compute: F,
        options: CacheOptions,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Display,
    {
        let full_key = Self::full_key(key);
        let started = Instant::now();

        {
            let mut store = self.store.write().await;
            if let Some(value) = store.get(&full_key) {
                match serde_json::from_value::<T>(value) {
                    Ok(data) => {
                        store.record_hit(started.elapsed());
                        debug!(key, "Cache hit");
                        return Ok(data);
                    }
                    Err(err) => {
                        warn!(key, error = %err, "Cached value has an unexpected shape, recomputing");
                        store.discard(&full_key);
                    }
                }
            }
        }

        debug!(key, "Cache miss");
        let result = compute().await;
        let elapsed = started.elapsed();

        let mut store = self.store.write().await;
        store.record_miss(elapsed);

        match result {
            Ok(data) => {
                match serde_json::to_value(&data) {
                    Ok(value) => {
                        // A value whose JSON form does not read back as T could never hit
                        if let Err(err) = serde_json::from_value::<T>(value.clone()) {
                            warn!(key, error = %err, "Computed value does not round-trip, not cached");
                        } else {
                            let ttl = options.ttl.unwrap_or(self.default_ttl);
                            store.set(full_key, value, ttl, options.tags.into_iter().collect());
                        }
                    }
                    Err(err) => {
                        warn!(key, error = %err, "Computed value is not serializable, not cached");
                    }
                }
                Ok(data)
            }
            Err(err) => {
                warn!(key, error = %err, "Query computation failed, nothing cached");
                Err(err)
            }
        }
    }

    // == Set ==
    /// Stores a value directly, bypassing computation.
    ///
    /// The memory limit is soft: an entry larger than the whole limit is
    /// accepted, logged at warn level, and usually evicted by the pass this
    /// insert triggers.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        options: CacheOptions,
    ) -> Result<()> {
        let value = serde_json::to_value(data)?;
        let ttl = options.ttl.unwrap_or(self.default_ttl);
        let tags: HashSet<String> = options.tags.into_iter().collect();

        self.store
            .write()
            .await
            .set(Self::full_key(key), value, ttl, tags);
        Ok(())
    }

    /// True if a live entry exists for `key`. Does not count as a lookup.
    pub async fn contains(&self, key: &str) -> bool {
        self.store.read().await.peek(&Self::full_key(key)).is_some()
    }

    // == Invalidation ==
    /// Removes every entry tagged with any of `tags`.
    ///
    /// Returns the number of entries removed.
    pub async fn invalidate_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> usize {
        let count = self.store.write().await.invalidate_by_tags(tags);
        let tags: Vec<&str> = tags.iter().map(|t| t.as_ref()).collect();
        info!(?tags, invalidated = count, "Invalidated cache entries by tag");
        count
    }

    /// Removes every entry tagged with all of `tags`.
    pub async fn invalidate_by_all_tags<S: AsRef<str>>(&self, tags: &[S]) -> usize {
        let count = self.store.write().await.invalidate_by_all_tags(tags);
        let tags: Vec<&str> = tags.iter().map(|t| t.as_ref()).collect();
        info!(?tags, invalidated = count, "Invalidated cache entries matching all tags");
        count
    }

    /// Removes a single key. Returns true if it was present.
    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.remove(&Self::full_key(key))
    }

    /// Removes every entry. Returns the number removed.
    pub async fn clear(&self) -> usize {
        let count = self.store.write().await.clear();
        info!(cleared = count, "Cache cleared");
        count
    }

    // == Maintenance ==
    /// Runs one expiration sweep immediately.
    pub async fn cleanup_expired_entries(&self) -> usize {
        self.store.write().await.cleanup_expired()
    }

    // == Stats ==
    /// Read-only statistics snapshot.
    pub async fn get_stats(&self) -> StatsSnapshot {
        self.store.read().await.stats()
    }

    // == Shutdown ==
    /// Stops the sweep and drops all entries, tags and counters.
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&self) {
        let handle = self
            .cleanup
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }

        self.store.write().await.reset();
        info!("Query cache shut down");
    }
}
