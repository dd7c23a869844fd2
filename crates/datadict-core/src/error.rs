//! Error types for datadict-core
//!
//! `CoreError` covers failures surfaced to callers; `LoadReport` collects
//! per-explore failures so a batch index can degrade instead of aborting.

use crate::api::ApiError;
use crate::cache::CacheKey;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Core error type for datadict operations
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    // ===================
    // Lookup Errors
    // ===================
    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    // ===================
    // Fetch Errors
    // ===================
    /// The API call behind a cache key failed. The source is shared because
    /// every caller that joined the same in-flight fetch sees the same error.
    #[error("Failed to fetch {key}")]
    Fetch {
        key: CacheKey,
        #[source]
        source: Arc<ApiError>,
    },

    /// An entry under `key` held the wrong kind of value
    #[error("Unexpected cache entry for {key}")]
    UnexpectedCacheEntry { key: CacheKey },

    #[error("Failed to build HTTP client: {message}")]
    HttpClient { message: String },

    // ===================
    // Config Errors
    // ===================
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl CoreError {
    pub fn fetch(key: CacheKey, source: Arc<ApiError>) -> Self {
        CoreError::Fetch { key, source }
    }

    /// Returns true when the upstream API answered "not found"
    pub fn is_not_found(&self) -> bool {
        match self {
            CoreError::ModelNotFound { .. } => true,
            CoreError::Fetch { source, .. } => matches!(**source, ApiError::NotFound { .. }),
            _ => false,
        }
    }
}

/// Severity level for errors during load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Non-critical, can continue with degraded functionality
    Warning,
    /// Significant but not fatal
    Error,
    /// Cannot continue
    Fatal,
}

/// Individual error entry in load report
#[derive(Debug, Clone, Serialize)]
pub struct LoadError {
    pub source: String,
    pub message: String,
    pub severity: ErrorSeverity,
}

impl LoadError {
    pub fn error(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            severity: ErrorSeverity::Error,
        }
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Build an entry from a CoreError, flattening its source chain into the message
    ///
    /// A not-found answer means the model list references an explore that no
    /// longer exists; it is reported as a warning.
    pub fn from_core_error(source: impl Into<String>, error: &CoreError) -> Self {
        let message = match error {
            CoreError::Fetch { source, .. } => format!("{}: {}", error, source),
            _ => error.to_string(),
        };

        let entry = Self::error(source, message);
        if error.is_not_found() {
            entry.with_severity(ErrorSeverity::Warning)
        } else {
            entry
        }
    }
}

/// Report of errors encountered during a batch index
///
/// Tracks partial failures instead of failing the whole run on one bad explore.
#[derive(Debug, Default, Clone, Serialize)]
pub struct LoadReport {
    pub errors: Vec<LoadError>,
    pub models_loaded: bool,
    pub explores_loaded: usize,
    pub explores_failed: usize,
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: LoadError) {
        self.errors.push(error);
    }

    /// Returns true if there are any fatal errors
    pub fn has_fatal_errors(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.severity == ErrorSeverity::Fatal)
    }

    /// Returns true if there are any errors (including warnings)
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns count by severity
    pub fn error_count(&self) -> (usize, usize, usize) {
        let count = |severity: ErrorSeverity| {
            self.errors
                .iter()
                .filter(|e| e.severity == severity)
                .count()
        };
        (
            count(ErrorSeverity::Warning),
            count(ErrorSeverity::Error),
            count(ErrorSeverity::Fatal),
        )
    }
}
