//! datadict configuration
//!
//! Read from `<config_dir>/datadict/config.toml` (or an explicit path).
//! A missing file yields defaults; CLI flags layer on top.

use crate::error::CoreError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub loader: LoaderConfig,
}

/// Looker API connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// e.g. `https://company.looker.com:19999`
    pub base_url: String,

    /// Pre-issued API token
    pub access_token: Option<String>,

    pub api_version: String,

    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            access_token: None,
            api_version: "4.0".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Metadata cache policy; both limits off means entries live as long as the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached entries
    pub max_capacity: Option<u64>,

    /// Entry lifetime after insertion
    pub time_to_live_secs: Option<u64>,
}

impl CacheConfig {
    pub fn time_to_live(&self) -> Option<Duration> {
        self.time_to_live_secs.map(Duration::from_secs)
    }

    pub fn is_bounded(&self) -> bool {
        self.max_capacity.is_some() || self.time_to_live_secs.is_some()
    }
}

/// Batch loader settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Explore fetches kept in flight by the batch index (1 = strictly sequential)
    pub concurrency: usize,

    /// Event bus channel capacity
    ///
    /// A batch index publishes one `IndexProgress` per explore. Subscribers
    /// that fall more than this many events behind get `RecvError::Lagged`
    /// and skip ahead; the loader's `watch` state never lags.
    pub event_capacity: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            event_capacity: 256,
        }
    }
}

impl DictionaryConfig {
    /// Default config file location: `<config_dir>/datadict/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("datadict").join(CONFIG_FILE_NAME))
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Load from `path` if given, else from the default location.
    /// A missing file is not an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        Self::load(&path)
    }

    /// Check invariants that serde cannot express
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.loader.concurrency == 0 {
            return Err(CoreError::InvalidConfig {
                message: "loader.concurrency must be at least 1".to_string(),
            });
        }

        if self.loader.event_capacity == 0 {
            return Err(CoreError::InvalidConfig {
                message: "loader.event_capacity must be at least 1".to_string(),
            });
        }

        if self.cache.max_capacity == Some(0) {
            return Err(CoreError::InvalidConfig {
                message: "cache.max_capacity must be at least 1 when set".to_string(),
            });
        }

        Ok(())
    }
}
