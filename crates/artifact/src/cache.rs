//! TTL-bounded cache of checksum digests, with a background sweeper task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::checksum::{Algorithm, DigestSet};

#[derive(Debug, Clone)]
struct CacheEntry {
    digests: DigestSet,
    last_refreshed: Instant,
}

/// Default sweep interval, matching the source's `checksumCache.expiredCheckInterval`.
pub const DEFAULT_EXPIRED_CHECK_INTERVAL: Duration = Duration::from_millis(300_000);
/// Default entry lifetime, matching the source's `checksumCache.lifetime`.
pub const DEFAULT_LIFETIME: Duration = Duration::from_millis(60_000);

#[derive(Debug)]
struct Inner {
    entries: RwLock<HashMap<String, CacheEntry>>,
    lifetime: Duration,
}

/// Shared, concurrency-safe checksum cache. Cheaply `Clone`-able (wraps an `Arc`).
#[derive(Debug, Clone)]
pub struct ChecksumCache {
    inner: Arc<Inner>,
}

impl ChecksumCache {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(HashMap::new()),
                lifetime,
            }),
        }
    }

    pub async fn get(&self, path: &str, algo: Algorithm) -> Option<String> {
        let entries = self.inner.entries.read().await;
        let entry = entries.get(path)?;
        if entry.last_refreshed.elapsed() > self.inner.lifetime {
            return None;
        }
        entry.digests.get(algo).map(|s| s.to_string())
    }

    pub async fn put(&self, path: impl Into<String>, digests: DigestSet) {
        let mut entries = self.inner.entries.write().await;
        entries.insert(
            path.into(),
            CacheEntry {
                digests,
                last_refreshed: Instant::now(),
            },
        );
    }

    pub async fn invalidate(&self, path: &str) {
        let mut entries = self.inner.entries.write().await;
        entries.remove(path);
    }

    async fn sweep(&self) {
        let mut entries = self.inner.entries.write().await;
        let lifetime = self.inner.lifetime;
        entries.retain(|_, entry| entry.last_refreshed.elapsed() <= lifetime);
    }

    /// Spawns the background sweeper. The returned handle should be aborted on shutdown.
    pub fn spawn_sweeper(&self, expired_check_interval: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(expired_check_interval);
            loop {
                ticker.tick().await;
                cache.sweep().await;
                tracing::debug!("checksum cache sweep completed");
            }
        })
    }
}

impl Default for ChecksumCache {
    fn default() -> Self {
        Self::new(DEFAULT_LIFETIME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = ChecksumCache::new(Duration::from_secs(60));
        let digests = DigestSet {
            md5: Some("abc".into()),
            sha1: Some("def".into()),
        };
        cache.put("org/foo/foo-1.0.jar", digests).await;
        assert_eq!(
            cache.get("org/foo/foo-1.0.jar", Algorithm::Md5).await,
            Some("abc".to_string())
        );
    }

    #[tokio::test]
    async fn expired_entries_are_absent() {
        let cache = ChecksumCache::new(Duration::from_millis(10));
        cache.put("p", DigestSet::default()).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("p", Algorithm::Md5).await, None);
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = ChecksumCache::new(Duration::from_secs(60));
        cache.put("p", DigestSet::default()).await;
        cache.invalidate("p").await;
        assert_eq!(cache.get("p", Algorithm::Md5).await, None);
    }

    #[tokio::test]
    async fn sweeper_evicts_expired_entries() {
        let cache = ChecksumCache::new(Duration::from_millis(5));
        cache.put("p", DigestSet::default()).await;
        let handle = cache.spawn_sweeper(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(40)).await;
        handle.abort();
        let entries = cache.inner.entries.read().await;
        assert!(entries.is_empty());
    }
}
