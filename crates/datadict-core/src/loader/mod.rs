//! Loaders built on a `DictionarySession`
//!
//! - `batch`: index every explore with incremental progress, tolerating failures
//! - `explore`: load one explore with a loading indicator
//! - `model_detail`: resolve a model and load all its explores, all-or-nothing

pub mod batch;
pub mod explore;
pub mod model_detail;

pub use batch::{explore_worklist, index_all_explores, BatchExploreLoader, BatchState};
pub use explore::{ExploreLoader, ExploreState};
pub use model_detail::{load_model, load_model_detail};
