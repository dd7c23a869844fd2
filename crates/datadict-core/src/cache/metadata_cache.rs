//! In-memory metadata cache for LookML models and explores
//!
//! Keyed by `CacheKey`: a fixed sentinel for the full model list, or a
//! (model, explore) pair. Backed by `moka::future::Cache`, which gives:
//! - single-flight: concurrent misses on one key run one producer, every
//!   caller gets that producer's result
//! - no negative caching: a failed producer stores nothing, the next call
//!   runs it again
//!
//! With the default `CacheConfig` entries are never evicted, so each key is
//! fetched at most once while its owning session is alive.

use crate::config::CacheConfig;
use crate::models::{ExploreId, LookmlExplore, LookmlModel};
use moka::future::Cache;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// String form of the model-list sentinel key
pub const ALL_MODELS_KEY: &str = "all_lookml_models";

/// Cache entry key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The full model list
    AllModels,
    /// One explore, displayed as `"{model}|{explore}"`
    Explore(ExploreId),
}

impl CacheKey {
    pub fn explore(model: impl Into<String>, explore: impl Into<String>) -> Self {
        CacheKey::Explore(ExploreId::new(model, explore))
    }
}

impl From<ExploreId> for CacheKey {
    fn from(id: ExploreId) -> Self {
        CacheKey::Explore(id)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::AllModels => f.write_str(ALL_MODELS_KEY),
            CacheKey::Explore(id) => write!(f, "{}|{}", id.model, id.explore),
        }
    }
}

/// Values stored by a session's cache
#[derive(Debug, Clone)]
pub enum CachedMetadata {
    Models(Arc<Vec<LookmlModel>>),
    Explore(Arc<LookmlExplore>),
}

impl CachedMetadata {
    pub fn into_models(self) -> Option<Arc<Vec<LookmlModel>>> {
        match self {
            CachedMetadata::Models(models) => Some(models),
            CachedMetadata::Explore(_) => None,
        }
    }

    pub fn into_explore(self) -> Option<Arc<LookmlExplore>> {
        match self {
            CachedMetadata::Explore(explore) => Some(explore),
            CachedMetadata::Models(_) => None,
        }
    }
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// `load_or_fetch` calls
    pub requests: u64,
    /// Producer runs
    pub fetches: u64,
    /// Producer runs that returned an error
    pub failures: u64,
}

impl CacheStats {
    /// Requests served without running a producer
    pub fn hits(&self) -> u64 {
        self.requests.saturating_sub(self.fetches)
    }

    pub fn hit_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.hits() as f64 / self.requests as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    fetches: AtomicU64,
    failures: AtomicU64,
}

/// Memoizing fetch cache
pub struct MetadataCache<V = CachedMetadata> {
    entries: Cache<CacheKey, V>,
    counters: Counters,
}

impl<V> MetadataCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache with the given eviction policy
    pub fn new(config: &CacheConfig) -> Self {
        let mut builder = Cache::builder();
        if let Some(capacity) = config.max_capacity {
            builder = builder.max_capacity(capacity);
        }
        if let Some(ttl) = config.time_to_live() {
            builder = builder.time_to_live(ttl);
        }

        debug!(
            max_capacity = ?config.max_capacity,
            time_to_live_secs = ?config.time_to_live_secs,
            "Metadata cache created"
        );

        Self {
            entries: builder.build(),
            counters: Counters::default(),
        }
    }

    /// Cache with no eviction
    pub fn unbounded() -> Self {
        Self::new(&CacheConfig::default())
    }

    /// Cached value for `key`, never fetches
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        self.entries.get(key).await
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Return the cached value for `key`, or run `producer` and cache its result
    ///
    /// Errors are returned to every waiting caller and never cached.
    pub async fn load_or_fetch<F, E>(&self, key: CacheKey, producer: F) -> Result<V, Arc<E>>
    where
        F: Future<Output = Result<V, E>>,
        E: Send + Sync + 'static,
    {
        self.counters.requests.fetch_add(1, Ordering::Relaxed);
        trace!(key = %key, "Cache lookup");

        let counters = &self.counters;
        let label = key.to_string();
        self.entries
            .try_get_with(key, async move {
                counters.fetches.fetch_add(1, Ordering::Relaxed);
                debug!(key = %label, "Cache miss, fetching");

                let result = producer.await;
                if result.is_err() {
                    counters.failures.fetch_add(1, Ordering::Relaxed);
                }
                result
            })
            .await
    }

    /// Drop one entry so the next access fetches again
    pub async fn invalidate(&self, key: &CacheKey) {
        self.entries.invalidate(key).await;
        debug!(key = %key, "Cache entry invalidated");
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.invalidate_all();
        debug!("Metadata cache cleared");
    }

    /// Number of live entries (flushes pending maintenance first)
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            requests: self.counters.requests.load(Ordering::Relaxed),
            fetches: self.counters.fetches.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }
}

impl<V> Default for MetadataCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    async fn counted(calls: &AtomicUsize, value: u32) -> Result<u32, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    async fn failing(calls: &AtomicUsize) -> Result<u32, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Err("boom".to_string())
    }

    #[test]
    fn test_key_display() {
        assert_eq!(CacheKey::AllModels.to_string(), "all_lookml_models");
        assert_eq!(CacheKey::explore("thelook", "orders").to_string(), "thelook|orders");
    }

    #[tokio::test]
    async fn test_memoizes_successful_fetch() {
        let cache: MetadataCache<u32> = MetadataCache::unbounded();
        let calls = AtomicUsize::new(0);
        let key = CacheKey::explore("a", "x");

        let first = cache.load_or_fetch(key.clone(), counted(&calls, 7)).await.unwrap();
        let second = cache.load_or_fetch(key.clone(), counted(&calls, 99)).await.unwrap();

        assert_eq!(first, 7);
        assert_eq!(second, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(&key).await, Some(7));

        let stats = cache.stats();
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.hits(), 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[tokio::test]
    async fn test_failure_not_cached() {
        let cache: MetadataCache<u32> = MetadataCache::unbounded();
        let calls = AtomicUsize::new(0);
        let key = CacheKey::explore("a", "y");

        let err = cache.load_or_fetch(key.clone(), failing(&calls)).await.unwrap_err();
        assert_eq!(err.as_str(), "boom");
        assert!(!cache.contains(&key));
        assert_eq!(cache.get(&key).await, None);

        let value = cache.load_or_fetch(key.clone(), counted(&calls, 3)).await.unwrap();
        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().failures, 1);
    }

    #[tokio::test]
    async fn test_keys_are_isolated() {
        let cache: MetadataCache<u32> = MetadataCache::unbounded();
        let calls = AtomicUsize::new(0);

        cache
            .load_or_fetch(CacheKey::explore("A", "x"), counted(&calls, 1))
            .await
            .unwrap();

        assert!(cache.contains(&CacheKey::explore("A", "x")));
        assert!(!cache.contains(&CacheKey::explore("B", "x")));

        let other = cache
            .load_or_fetch(CacheKey::explore("B", "x"), counted(&calls, 2))
            .await
            .unwrap();
        assert_eq!(other, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_pipe_in_names_does_not_collide() {
        let cache: MetadataCache<u32> = MetadataCache::unbounded();
        let calls = AtomicUsize::new(0);

        cache
            .load_or_fetch(CacheKey::explore("a|b", "c"), counted(&calls, 1))
            .await
            .unwrap();
        let value = cache
            .load_or_fetch(CacheKey::explore("a", "b|c"), counted(&calls, 2))
            .await
            .unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let cache: MetadataCache<u32> = MetadataCache::unbounded();
        let calls = AtomicUsize::new(0);
        let key = CacheKey::AllModels;

        let slow = |value| {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok::<u32, String>(value)
            }
        };

        let (a, b) = tokio::join!(
            cache.load_or_fetch(key.clone(), slow(1)),
            cache.load_or_fetch(key.clone(), slow(2)),
        );

        assert_eq!(a.unwrap(), 1);
        assert_eq!(b.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache: MetadataCache<u32> = MetadataCache::unbounded();
        let calls = AtomicUsize::new(0);
        let key = CacheKey::explore("a", "x");

        cache.load_or_fetch(key.clone(), counted(&calls, 1)).await.unwrap();
        cache.invalidate(&key).await;
        assert!(!cache.contains(&key));

        cache.load_or_fetch(key.clone(), counted(&calls, 2)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        cache.clear();
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_entry_is_fetched_again() {
        let cache: MetadataCache<u32> = MetadataCache::new(&CacheConfig {
            time_to_live_secs: Some(1),
            ..CacheConfig::default()
        });
        let calls = AtomicUsize::new(0);
        let key = CacheKey::explore("a", "x");

        cache.load_or_fetch(key.clone(), counted(&calls, 1)).await.unwrap();
        cache.load_or_fetch(key.clone(), counted(&calls, 2)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(cache.get(&key).await, None);

        let value = cache.load_or_fetch(key.clone(), counted(&calls, 3)).await.unwrap();
        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_capacity_bound_evicts() {
        let cache: MetadataCache<u32> = MetadataCache::new(&CacheConfig {
            max_capacity: Some(1),
            ..CacheConfig::default()
        });
        let calls = AtomicUsize::new(0);

        for (i, explore) in ["x", "y", "z"].into_iter().enumerate() {
            cache
                .load_or_fetch(CacheKey::explore("a", explore), counted(&calls, i as u32))
                .await
                .unwrap();
        }

        // len() flushes pending maintenance, which applies the size bound
        assert_eq!(cache.len().await, 1);

        let mut refetched = 0;
        for explore in ["x", "y", "z"] {
            let before = calls.load(Ordering::SeqCst);
            cache
                .load_or_fetch(CacheKey::explore("a", explore), counted(&calls, 9))
                .await
                .unwrap();
            refetched += calls.load(Ordering::SeqCst) - before;
        }
        assert!(refetched >= 2);
    }

    #[test]
    fn test_cached_metadata_accessors() {
        let models = CachedMetadata::Models(Arc::new(Vec::new()));
        assert!(models.clone().into_models().is_some());
        assert!(models.into_explore().is_none());
    }
}
