//! Remote metadata source
//!
//! `LookerApi` is the seam between the loaders and whatever actually talks
//! to Looker. `HttpLookerApi` is the REST implementation; tests substitute
//! their own.

pub mod http;

pub use http::HttpLookerApi;

use crate::models::{LookmlExplore, LookmlModel};
use std::future::Future;
use thiserror::Error;

/// Failure of a single API call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Not found: {url}")]
    NotFound { url: String },

    #[error("HTTP {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Invalid response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },
}

/// Source of LookML metadata
///
/// Both calls are async and fallible; callers never retry on their own, the
/// metadata cache decides when a fetch happens.
pub trait LookerApi: Send + Sync {
    /// Every model visible to the caller, with explore references
    fn list_all_models(&self) -> impl Future<Output = Result<Vec<LookmlModel>, ApiError>> + Send;

    /// Full metadata for one explore
    fn get_explore(
        &self,
        model_name: &str,
        explore_name: &str,
    ) -> impl Future<Output = Result<LookmlExplore, ApiError>> + Send;
}

impl<T: LookerApi> LookerApi for std::sync::Arc<T> {
    fn list_all_models(&self) -> impl Future<Output = Result<Vec<LookmlModel>, ApiError>> + Send {
        (**self).list_all_models()
    }

    fn get_explore(
        &self,
        model_name: &str,
        explore_name: &str,
    ) -> impl Future<Output = Result<LookmlExplore, ApiError>> + Send {
        (**self).get_explore(model_name, explore_name)
    }
}
