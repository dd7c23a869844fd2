//! datadict-core - Core library for datadict
//!
//! Fetches LookML models and explores from Looker, memoizes them per
//! session and indexes every explore with incremental progress.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod loader;
pub mod models;
pub mod search;
pub mod session;

pub use api::{ApiError, HttpLookerApi, LookerApi};
pub use cache::{CacheKey, CacheStats, MetadataCache};
pub use config::DictionaryConfig;
pub use error::{CoreError, LoadReport};
pub use event::{DataEvent, EventBus};
pub use loader::{
    index_all_explores, load_model, load_model_detail, BatchExploreLoader, BatchState,
    ExploreLoader, ExploreState,
};
pub use search::{search_fields, SearchHit};
pub use session::DictionarySession;
