//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically removes expired entries.
///
/// Each sweep runs in its own task, so a sweep that panics is logged and the
/// next interval still fires. Abort the returned handle to stop sweeping.
///
/// # Example
/// ```ignore
/// let store = Arc::new(RwLock::new(CacheStore::new(1000, 50 * 1024 * 1024)));
/// let cleanup_handle = spawn_cleanup_task(store.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(store: Arc<RwLock<CacheStore>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let sweep_store = store.clone();
            let sweep = tokio::spawn(async move { sweep_store.write().await.cleanup_expired() });

            match sweep.await {
                Ok(0) => debug!("TTL cleanup: no expired entries found"),
                Ok(removed) => info!("TTL cleanup: removed {} expired entries", removed),
                Err(err) => error!(error = %err, "TTL cleanup sweep failed, retrying next interval"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn shared_store() -> Arc<RwLock<CacheStore>> {
        Arc::new(RwLock::new(CacheStore::new(100, usize::MAX)))
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let store = shared_store();

        {
            let mut guard = store.write().await;
            guard.set(
                "expire_soon".to_string(),
                json!("value"),
                Duration::from_millis(50),
                HashSet::from(["t".to_string()]),
            );
        }

        let handle = spawn_cleanup_task(store.clone(), Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(350)).await;

        {
            let guard = store.read().await;
            assert!(!guard.contains_key("expire_soon"));
            assert!(guard.tag_index().is_empty());
            assert_eq!(guard.stats().expirations, 1);
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let store = shared_store();

        {
            let mut guard = store.write().await;
            guard.set(
                "long_lived".to_string(),
                json!("value"),
                Duration::from_secs(3600),
                HashSet::new(),
            );
        }

        let handle = spawn_cleanup_task(store.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(200)).await;

        {
            let mut guard = store.write().await;
            assert_eq!(guard.get("long_lived"), Some(json!("value")));
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(shared_store(), Duration::from_secs(1));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
