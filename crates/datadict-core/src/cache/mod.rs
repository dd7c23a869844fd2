//! Caching layer for datadict-core
//!
//! Provides the in-memory metadata cache shared by every loader of a session.

pub mod metadata_cache;

pub use metadata_cache::{CacheKey, CacheStats, CachedMetadata, MetadataCache, ALL_MODELS_KEY};
