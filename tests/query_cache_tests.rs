//! End-to-end tests for the query cache facade.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use query_cache::{CacheOptions, Config, QueryCache};
use serde::{Deserialize, Serialize};
use tokio_test::{assert_err, assert_ok};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Price {
    price: u32,
}

fn fresh_cache() -> QueryCache {
    QueryCache::new(&Config::default())
}

async fn fetch_price(cache: &QueryCache, calls: &AtomicUsize) -> Price {
    cache
        .get(
            "svc:123",
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(Price { price: 50 })
            },
            CacheOptions::new()
                .with_ttl(Duration::from_millis(1000))
                .with_tag("tenant:A"),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_ttl_scenario() {
    let cache = fresh_cache();
    cache
        .set(
            "svc:123",
            &Price { price: 50 },
            CacheOptions::new()
                .with_ttl(Duration::from_millis(1000))
                .with_tag("tenant:A"),
        )
        .await
        .unwrap();
    let calls = AtomicUsize::new(0);

    // Immediate lookup is a hit
    assert_eq!(fetch_price(&cache, &calls).await, Price { price: 50 });
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(cache.get_stats().await.total_hits, 1);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    // After the TTL the lookup misses and recomputes
    assert_eq!(fetch_price(&cache, &calls).await, Price { price: 50 });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.get_stats().await.total_misses, 1);
}

#[tokio::test]
async fn test_invalidation_scenario() {
    let cache = fresh_cache();
    cache
        .set(
            "svc:123",
            &Price { price: 50 },
            CacheOptions::new()
                .with_ttl(Duration::from_millis(1000))
                .with_tag("tenant:A"),
        )
        .await
        .unwrap();

    assert_eq!(cache.invalidate_by_tags(&["tenant:A"]).await, 1);
    assert_eq!(cache.invalidate_by_tags(&["tenant:A"]).await, 0);
    assert_eq!(cache.get_stats().await.tag_count, 0);

    // The next lookup starts a fresh entry
    let calls = AtomicUsize::new(0);
    fetch_price(&cache, &calls).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalidation_leaves_other_tags_alone() {
    let cache = fresh_cache();
    cache
        .set("x", &1, CacheOptions::new().with_tags(["tenant:A", "analytics"]))
        .await
        .unwrap();
    cache
        .set("y", &2, CacheOptions::new().with_tags(["tenant:B", "analytics"]))
        .await
        .unwrap();

    assert_eq!(cache.invalidate_by_tags(&["tenant:A"]).await, 1);
    assert!(!cache.contains("x").await);
    assert!(cache.contains("y").await);
}

#[tokio::test]
async fn test_failure_is_retried_not_cached() {
    let cache = fresh_cache();
    let calls = AtomicUsize::new(0);

    for _ in 0..2 {
        let result: Result<u32, std::io::Error> = cache
            .get(
                "report",
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow query"))
                },
                CacheOptions::new(),
            )
            .await;

        let err = assert_err!(result);
        assert_eq!(err.kind(), std::io::ErrorKind::TimedOut);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!cache.contains("report").await);
    assert_eq!(cache.get_stats().await.total_entries, 0);
}

#[tokio::test]
async fn test_concurrent_misses_each_compute() {
    let cache = fresh_cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(tokio::sync::Barrier::new(2));

    let mut handles = Vec::new();
    for i in 0..2u32 {
        let cache = cache.clone();
        let calls = calls.clone();
        let gate = gate.clone();
        handles.push(tokio::spawn(async move {
            cache
                .get(
                    "dup",
                    || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        // Both computations are in flight before either stores
                        gate.wait().await;
                        Ok::<_, String>(i)
                    },
                    CacheOptions::new(),
                )
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.get_stats().await.total_misses, 2);
    assert_eq!(cache.get_stats().await.total_entries, 1);
}

#[tokio::test]
async fn test_sweep_runs_in_background() {
    let config = Config {
        cleanup_interval_secs: 1,
        ..Config::default()
    };
    let cache = QueryCache::init(&config);
    assert_ok!(
        cache
            .set(
                "short",
                &1,
                CacheOptions::new()
                    .with_ttl(Duration::from_millis(100))
                    .with_tag("t"),
            )
            .await
    );

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let stats = cache.get_stats().await;
    assert_eq!(stats.total_entries, 0);
    assert_eq!(stats.tag_count, 0);
    assert_eq!(stats.expirations, 1);

    cache.shutdown().await;
}

#[tokio::test]
async fn test_eviction_under_entry_pressure() {
    let config = Config {
        max_entries: 20,
        ..Config::default()
    };
    let cache = QueryCache::new(&config);

    for i in 0..20 {
        cache.set(&format!("k{}", i), &i, CacheOptions::new()).await.unwrap();
    }
    // Touch the oldest key so it survives the next eviction pass
    let _: i32 = cache
        .get("k0", || async { Ok::<_, String>(-1) }, CacheOptions::new())
        .await
        .unwrap();

    cache.set("k20", &20, CacheOptions::new()).await.unwrap();

    let stats = cache.get_stats().await;
    assert_eq!(stats.evictions, 2);
    assert_eq!(stats.total_entries, 19);
    assert!(cache.contains("k0").await);
    assert!(!cache.contains("k1").await);
    assert!(!cache.contains("k2").await);
    assert!(cache.contains("k20").await);
}
