//! Cache Warmup
//!
//! Best-effort pre-population of a tenant's entries. Each entry computes
//! independently; one failure never stops the others.

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::query::analytics::tenant_tag;
use crate::query::{CacheOptions, QueryCache};

pub type WarmupFuture = Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send>>;
type WarmupFn = Box<dyn FnOnce() -> WarmupFuture + Send>;

// == Warmup Entry ==
/// A key to pre-populate and the computation producing its value.
pub struct WarmupEntry {
    pub key: String,
    compute: WarmupFn,
    pub options: CacheOptions,
}

impl WarmupEntry {
    pub fn new<F, Fut>(key: impl Into<String>, compute: F, options: CacheOptions) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self {
            key: key.into(),
            compute: Box::new(move || Box::pin(compute()) as WarmupFuture),
            options,
        }
    }
}

impl std::fmt::Debug for WarmupEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarmupEntry")
            .field("key", &self.key)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// == Warmup Report ==
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WarmupReport {
    /// Entries now present in the cache
    pub populated: usize,
    /// Entries whose computation failed or panicked
    pub failed: usize,
}

impl QueryCache {
    // == Warm Cache ==
    /// Computes every entry concurrently and caches the successes, tagged
    /// with the tenant.
    pub async fn warm_cache(&self, tenant_id: &str, entries: Vec<WarmupEntry>) -> WarmupReport {
        let mut tasks = JoinSet::new();

        for entry in entries {
            let cache = self.clone();
            let options = entry.options.with_tag(tenant_tag(tenant_id));
            let key = entry.key;
            let compute = entry.compute;

            tasks.spawn(async move {
                let result = cache.get::<Value, _, _, _>(&key, compute, options).await;
                (key, result.map(|_| ()))
            });
        }

        let mut report = WarmupReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => report.populated += 1,
                Ok((key, Err(err))) => {
                    warn!(tenant_id, key = %key, error = %err, "Cache warmup entry failed");
                    report.failed += 1;
                }
                Err(err) => {
                    warn!(tenant_id, error = %err, "Cache warmup task panicked");
                    report.failed += 1;
                }
            }
        }

        info!(
            tenant_id,
            populated = report.populated,
            failed = report.failed,
            "Cache warmup finished"
        );
        report
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;

    #[tokio::test]
    async fn test_warmup_isolates_failures() {
        let cache = QueryCache::new(&Config::default());

        let entries = vec![
            WarmupEntry::new("ok-1", || async { anyhow::Ok(json!(1)) }, CacheOptions::new()),
            WarmupEntry::new(
                "broken",
                || async { Err(anyhow::anyhow!("upstream timeout")) },
                CacheOptions::new(),
            ),
            WarmupEntry::new("ok-2", || async { anyhow::Ok(json!({"n": 2})) }, CacheOptions::new()),
        ];

        let report = cache.warm_cache("biz-1", entries).await;

        assert_eq!(report, WarmupReport { populated: 2, failed: 1 });
        assert!(cache.contains("ok-1").await);
        assert!(cache.contains("ok-2").await);
        assert!(!cache.contains("broken").await);
    }

    #[tokio::test]
    async fn test_warmup_entries_carry_tenant_tag() {
        let cache = QueryCache::new(&Config::default());

        let entries = vec![
            WarmupEntry::new("a", || async { anyhow::Ok(json!(1)) }, CacheOptions::new().with_tag("x")),
            WarmupEntry::new("b", || async { anyhow::Ok(json!(2)) }, CacheOptions::new()),
        ];
        cache.warm_cache("biz-9", entries).await;

        assert_eq!(cache.invalidate_by_tags(&["tenant:biz-9"]).await, 2);
    }

    #[tokio::test]
    async fn test_warmed_value_is_served_as_hit() {
        let cache = QueryCache::new(&Config::default());
        cache
            .warm_cache(
                "biz-1",
                vec![WarmupEntry::new("count", || async { anyhow::Ok(json!(5)) }, CacheOptions::new())],
            )
            .await;

        let value: u32 = cache
            .get("count", || async { Ok::<_, String>(0) }, CacheOptions::new())
            .await
            .unwrap();

        assert_eq!(value, 5);
        assert_eq!(cache.get_stats().await.total_hits, 1);
    }
}
