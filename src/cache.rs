use crate::devops::source::{FileChange, LineStats};
use crate::diff::stats::LineStatsMode;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cache key for the change list of one pull request at one source commit
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct EnrichmentKey {
    pub repository: String,
    pub id: i32,
    pub source_commit: String,
    pub mode: LineStatsMode,
}

/// Changes and line counts never move for a fixed source commit
#[derive(Debug, Clone)]
pub struct CachedChanges {
    pub changes: Vec<FileChange>,
    pub stats: LineStats,
}

/// Thread-safe LRU cache of commit-stable enrichment data
pub struct EnrichmentCache {
    cache: Arc<RwLock<LruCache<EnrichmentKey, CachedChanges>>>,
}

impl EnrichmentCache {
    /// Create a new cache with the specified capacity
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(RwLock::new(LruCache::new(cap))),
        }
    }

    pub async fn get(&self, key: &EnrichmentKey) -> Option<CachedChanges> {
        let mut cache = self.cache.write().await;
        cache.get(key).cloned()
    }

    pub async fn put(&self, key: EnrichmentKey, entry: CachedChanges) {
        let mut cache = self.cache.write().await;
        cache.put(key, entry);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }
}

impl Clone for EnrichmentCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl Default for EnrichmentCache {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: i32, commit: &str) -> EnrichmentKey {
        EnrichmentKey {
            repository: "repo".to_string(),
            id,
            source_commit: commit.to_string(),
            mode: LineStatsMode::Exact,
        }
    }

    fn entry(added: u32) -> CachedChanges {
        CachedChanges {
            changes: Vec::new(),
            stats: LineStats { added, deleted: 0 },
        }
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = EnrichmentCache::new(4);
        let shared = cache.clone();
        cache.put(key(1, "abc"), entry(3)).await;

        let hit = shared.get(&key(1, "abc")).await.unwrap();
        assert_eq!(hit.stats.added, 3);
        assert!(shared.get(&key(1, "def")).await.is_none());
    }

    #[tokio::test]
    async fn test_evicts_least_recent() {
        let cache = EnrichmentCache::new(2);
        cache.put(key(1, "a"), entry(1)).await;
        cache.put(key(2, "b"), entry(2)).await;
        cache.get(&key(1, "a")).await;
        cache.put(key(3, "c"), entry(3)).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get(&key(2, "b")).await.is_none());
        assert!(cache.get(&key(1, "a")).await.is_some());
    }

    #[tokio::test]
    async fn test_line_stats_mode_is_part_of_the_key() {
        let cache = EnrichmentCache::new(4);
        cache.put(key(1, "abc"), entry(7)).await;

        let estimated = EnrichmentKey {
            mode: LineStatsMode::Estimate,
            ..key(1, "abc")
        };
        assert!(cache.get(&estimated).await.is_none());

        cache.put(estimated.clone(), entry(10)).await;
        assert_eq!(cache.get(&estimated).await.unwrap().stats.added, 10);
        assert_eq!(cache.get(&key(1, "abc")).await.unwrap().stats.added, 7);
    }
}
