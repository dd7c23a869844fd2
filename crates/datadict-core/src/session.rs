//! Dictionary session: owns the API client, metadata cache and event bus
//!
//! One session per connected user. The cache lives exactly as long as the
//! session; every loader borrows the session instead of reaching for
//! global state.

use crate::api::{ApiError, LookerApi};
use crate::cache::{CacheKey, CacheStats, CachedMetadata, MetadataCache};
use crate::config::{DictionaryConfig, LoaderConfig};
use crate::error::CoreError;
use crate::event::{DataEvent, EventBus};
use crate::models::{LookmlExplore, LookmlModel};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Central metadata access point
pub struct DictionarySession<A> {
    api: A,

    /// Memoized models and explores
    cache: MetadataCache,

    /// Event bus for notifying subscribers
    event_bus: EventBus,

    loader_config: LoaderConfig,

    started_at: DateTime<Utc>,
}

impl<A: LookerApi> DictionarySession<A> {
    /// Create a session, validating the configuration
    pub fn new(api: A, config: &DictionaryConfig) -> Result<Self, CoreError> {
        config.validate()?;

        let session = Self {
            api,
            cache: MetadataCache::new(&config.cache),
            event_bus: EventBus::new(config.loader.event_capacity),
            loader_config: config.loader.clone(),
            started_at: Utc::now(),
        };

        debug!(
            concurrency = session.loader_config.concurrency,
            bounded_cache = config.cache.is_bounded(),
            "Dictionary session started"
        );

        Ok(session)
    }

    /// Create with default configuration
    pub fn with_defaults(api: A) -> Self {
        Self {
            api,
            cache: MetadataCache::unbounded(),
            event_bus: EventBus::default_capacity(),
            loader_config: LoaderConfig::default(),
            started_at: Utc::now(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Get the event bus for subscribing to updates
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn loader_config(&self) -> &LoaderConfig {
        &self.loader_config
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// All models, fetched once per session
    pub async fn all_models(&self) -> Result<Arc<Vec<LookmlModel>>, CoreError> {
        let key = CacheKey::AllModels;
        let value = self
            .cache
            .load_or_fetch(key.clone(), async {
                let models = self.api.list_all_models().await?;
                self.event_bus.publish(DataEvent::ModelsLoaded {
                    count: models.len(),
                });
                Ok::<_, ApiError>(CachedMetadata::Models(Arc::new(models)))
            })
            .await
            .map_err(|e| CoreError::fetch(key.clone(), e))?;

        value
            .into_models()
            .ok_or(CoreError::UnexpectedCacheEntry { key })
    }

    /// One explore, fetched once per session
    pub async fn explore(
        &self,
        model_name: &str,
        explore_name: &str,
    ) -> Result<Arc<LookmlExplore>, CoreError> {
        let key = CacheKey::explore(model_name, explore_name);
        let value = self
            .cache
            .load_or_fetch(key.clone(), async {
                let explore = self.api.get_explore(model_name, explore_name).await?;
                Ok::<_, ApiError>(CachedMetadata::Explore(Arc::new(explore)))
            })
            .await
            .map_err(|e| CoreError::fetch(key.clone(), e))?;

        value
            .into_explore()
            .ok_or(CoreError::UnexpectedCacheEntry { key })
    }

    /// Already-loaded explore, never fetches
    pub async fn cached_explore(
        &self,
        model_name: &str,
        explore_name: &str,
    ) -> Option<Arc<LookmlExplore>> {
        self.cache
            .get(&CacheKey::explore(model_name, explore_name))
            .await
            .and_then(CachedMetadata::into_explore)
    }

    /// Drop every cached entry; the next access refetches
    pub fn clear_cache(&self) {
        self.cache.clear();
        self.event_bus.publish(DataEvent::CacheCleared);
    }

    /// End the session, returning final cache counters
    pub fn close(self) -> CacheStats {
        let stats = self.cache.stats();
        info!(
            requests = stats.requests,
            fetches = stats.fetches,
            failures = stats.failures,
            hit_rate = %format!("{:.2}", stats.hit_rate()),
            uptime_secs = (Utc::now() - self.started_at).num_seconds(),
            "Dictionary session closed"
        );
        stats
    }
}
