//! Store Backends
//!
//! The `ResponseStore` trait is the contract the cache wrapper depends on.
//! `MemoryStore` is the process-local implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::cache::{CacheStats, CacheStore};

// == Response Store ==
/// Storage contract for cached responses.
///
/// Each call is atomic with respect to the others. A shared external store
/// can implement this trait and replace `MemoryStore` without touching the
/// wrapper.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Payload for `key` if present and not expired. Only a hit is counted.
    async fn lookup(&self, key: &str) -> Option<String>;

    /// Counts one request that had to recompute its response.
    async fn record_miss(&self);

    /// Inserts or overwrites `key` for `ttl`, registering it under `tags`.
    async fn store(&self, key: &str, payload: String, ttl: Duration, tags: &[String]);

    /// Removes every entry under `tag`. Returns how many were removed.
    async fn evict_by_tag(&self, tag: &str) -> usize;

    /// Removes everything. Returns how many entries were removed.
    async fn clear_all(&self) -> usize;

    async fn stats(&self) -> CacheStats;

    /// Evicts each of `tags` in turn. Returns the total removed.
    async fn evict_tags(&self, tags: &[String]) -> usize {
        let mut removed = 0;
        for tag in tags {
            removed += self.evict_by_tag(tag).await;
        }
        removed
    }
}

// == Memory Store ==
/// In-process store shared behind an async lock.
///
/// Cloning is cheap and every clone sees the same entries. Nothing survives
/// a restart and separate processes hold separate caches.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<CacheStore>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseStore for MemoryStore {
    async fn lookup(&self, key: &str) -> Option<String> {
        // Write lock: an expired entry is dropped and the hit counter moves
        self.inner.write().await.lookup(key, Instant::now())
    }

    async fn record_miss(&self) {
        self.inner.write().await.record_miss();
    }

    async fn store(&self, key: &str, payload: String, ttl: Duration, tags: &[String]) {
        self.inner
            .write()
            .await
            .store(key.to_string(), payload, ttl, tags, Instant::now());
    }

    async fn evict_by_tag(&self, tag: &str) -> usize {
        self.inner.write().await.evict_by_tag(tag)
    }

    async fn clear_all(&self) -> usize {
        self.inner.write().await.clear_all()
    }

    async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }

    /// All tags go under one lock acquisition.
    async fn evict_tags(&self, tags: &[String]) -> usize {
        let mut store = self.inner.write().await;
        tags.iter().map(|tag| store.evict_by_tag(tag)).sum()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        store
            .store("/a", "payload".to_string(), Duration::from_secs(60), &[])
            .await;

        assert_eq!(store.lookup("/a").await.as_deref(), Some("payload"));
        assert!(store.lookup("/b").await.is_none());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();

        store
            .store("/a", "v".to_string(), Duration::from_secs(60), &["x".to_string()])
            .await;
        assert_eq!(other.evict_by_tag("x").await, 1);
        assert!(store.lookup("/a").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_store_expiry_uses_runtime_clock() {
        let store = MemoryStore::new();
        store
            .store("/a", "v".to_string(), Duration::from_secs(5), &[])
            .await;

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(store.lookup("/a").await.is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(store.lookup("/a").await.is_none());
    }

    #[tokio::test]
    async fn test_evict_tags() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);
        store.store("/a", "a".to_string(), ttl, &["x".to_string()]).await;
        store.store("/b", "b".to_string(), ttl, &["y".to_string()]).await;
        store.store("/c", "c".to_string(), ttl, &["z".to_string()]).await;

        let tags = vec!["x".to_string(), "y".to_string(), "unknown".to_string()];
        assert_eq!(store.evict_tags(&tags).await, 2);
        assert_eq!(store.stats().await.total_entries, 1);
    }

    #[tokio::test]
    async fn test_trait_object() {
        let store: Arc<dyn ResponseStore> = Arc::new(MemoryStore::new());
        store
            .store("/a", "v".to_string(), Duration::from_secs(60), &[])
            .await;
        assert_eq!(store.clear_all().await, 1);
        assert_eq!(store.stats().await.clears, 1);
    }
}
