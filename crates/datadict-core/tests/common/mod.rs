//! Shared fixtures for datadict-core integration tests

#![allow(dead_code)]

use datadict_core::api::{ApiError, LookerApi};
use datadict_core::config::DictionaryConfig;
use datadict_core::models::{LookmlExplore, LookmlModel};
use datadict_core::DictionarySession;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory `LookerApi` with call counting and failure injection
#[derive(Default)]
pub struct FakeApi {
    models: Vec<LookmlModel>,
    failing: Mutex<HashSet<String>>,
    explore_calls: Mutex<HashMap<String, usize>>,
    model_calls: AtomicUsize,
    models_down: AtomicBool,
    delay: Option<Duration>,
}

impl FakeApi {
    /// Build from `(model, [explores])` pairs
    pub fn new(models: &[(&str, &[&str])]) -> Self {
        let models = models
            .iter()
            .map(|(name, explores)| {
                let explores: Vec<_> = explores
                    .iter()
                    .map(|e| serde_json::json!({ "name": e }))
                    .collect();
                serde_json::from_value(serde_json::json!({ "name": name, "explores": explores }))
                    .unwrap()
            })
            .collect();

        Self {
            models,
            ..Self::default()
        }
    }

    /// `[{A:[x,y]}, {B:[z]}]`
    pub fn abz() -> Self {
        Self::new(&[("A", &["x", "y"]), ("B", &["z"])])
    }

    /// Every explore fetch sleeps for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn models(&self) -> Vec<LookmlModel> {
        self.models.clone()
    }

    pub fn fail(&self, model: &str, explore: &str) {
        self.failing.lock().insert(format!("{}|{}", model, explore));
    }

    pub fn recover(&self, model: &str, explore: &str) {
        self.failing.lock().remove(&format!("{}|{}", model, explore));
    }

    /// Make `list_all_models` answer with HTTP 503
    pub fn fail_models(&self) {
        self.models_down.store(true, Ordering::SeqCst);
    }

    pub fn explore_calls(&self, model: &str, explore: &str) -> usize {
        self.explore_calls
            .lock()
            .get(&format!("{}|{}", model, explore))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_explore_calls(&self) -> usize {
        self.explore_calls.lock().values().sum()
    }

    pub fn model_calls(&self) -> usize {
        self.model_calls.load(Ordering::SeqCst)
    }
}

impl LookerApi for FakeApi {
    async fn list_all_models(&self) -> Result<Vec<LookmlModel>, ApiError> {
        self.model_calls.fetch_add(1, Ordering::SeqCst);
        if self.models_down.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                url: "fake://lookml_models".to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self.models.clone())
    }

    async fn get_explore(
        &self,
        model_name: &str,
        explore_name: &str,
    ) -> Result<LookmlExplore, ApiError> {
        let key = format!("{}|{}", model_name, explore_name);
        *self.explore_calls.lock().entry(key.clone()).or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let url = format!("fake://lookml_models/{}/explores/{}", model_name, explore_name);
        if self.failing.lock().contains(&key) {
            return Err(ApiError::Status {
                url,
                status: 500,
                body: "internal error".to_string(),
            });
        }

        let known = self
            .models
            .iter()
            .any(|m| m.name == model_name && m.explores.iter().any(|e| e.name == explore_name));
        if !known {
            return Err(ApiError::NotFound { url });
        }

        Ok(serde_json::from_value(serde_json::json!({
            "name": explore_name,
            "model_name": model_name,
            "fields": {
                "dimensions": [{ "name": format!("{}.id", explore_name) }]
            }
        }))
        .unwrap())
    }
}

/// Session over a shared fake, with the given batch concurrency
pub fn session(api: &Arc<FakeApi>, concurrency: usize) -> DictionarySession<Arc<FakeApi>> {
    let mut config = DictionaryConfig::default();
    config.loader.concurrency = concurrency;
    DictionarySession::new(Arc::clone(api), &config).unwrap()
}

/// `model.explore` names of a result list
pub fn ids(explores: &[Arc<LookmlExplore>]) -> Vec<String> {
    explores.iter().map(|e| e.id().to_string()).collect()
}
