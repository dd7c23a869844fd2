//! Batch explore indexer
//!
//! Walks every (model, explore) pair of a model list through the session
//! cache and publishes the growing result list after each step. A failed
//! explore is logged, recorded in the `LoadReport` and dropped from the
//! denominator; the run keeps going.
//!
//! Progress contract for observers: `completed` never decreases and
//! `total` never increases within one run.

use crate::api::LookerApi;
use crate::error::{ErrorSeverity, LoadError, LoadReport};
use crate::event::DataEvent;
use crate::models::{ExploreId, LookmlExplore, LookmlModel, Progress};
use crate::session::DictionarySession;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Observable state of the current batch run
#[derive(Debug, Clone, Default)]
pub struct BatchState {
    /// Loaded explores in worklist order
    pub explores: Vec<Arc<LookmlExplore>>,
    pub progress: Progress,
}

impl BatchState {
    fn reset(total: usize) -> Self {
        Self {
            explores: Vec::with_capacity(total),
            progress: Progress::new(total),
        }
    }

    /// Progress string, e.g. `"12 / 40"`
    pub fn loading_percent(&self) -> String {
        self.progress.to_string()
    }
}

/// Flatten models into (model, explore) pairs: model order, then explore order
pub fn explore_worklist(models: &[LookmlModel]) -> Vec<ExploreId> {
    models.iter().flat_map(|model| model.explore_ids()).collect()
}

/// Indexes every explore of a model list
///
/// Holds the latest `BatchState`; each `run` replaces it. When a second run
/// starts before the first finishes, the first keeps fetching (warming the
/// cache) but its updates no longer reach the state or the event bus.
pub struct BatchExploreLoader {
    state: watch::Sender<BatchState>,
    generation: AtomicU64,
}

impl Default for BatchExploreLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchExploreLoader {
    pub fn new() -> Self {
        let (state, _) = watch::channel(BatchState::default());
        Self {
            state,
            generation: AtomicU64::new(0),
        }
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<BatchState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> BatchState {
        self.state.borrow().clone()
    }

    /// Index all explores of `models` through the session cache
    ///
    /// Keeps `loader.concurrency` fetches in flight (1 = strictly
    /// sequential) but always consumes results in worklist order.
    pub async fn run<A: LookerApi>(
        &self,
        session: &DictionarySession<A>,
        models: &[LookmlModel],
    ) -> LoadReport {
        let worklist = explore_worklist(models);
        let total = worklist.len();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let concurrency = session.loader_config().concurrency.max(1);

        let mut report = LoadReport::new();
        report.models_loaded = true;

        self.state.send_replace(BatchState::reset(total));
        session
            .event_bus()
            .publish(DataEvent::IndexProgress(Progress::new(total)));

        info!(
            models = models.len(),
            explores = total,
            concurrency,
            "Indexing explores"
        );

        let mut results = stream::iter(worklist)
            .map(|id| async move {
                let result = session.explore(&id.model, &id.explore).await;
                (id, result)
            })
            .buffered(concurrency);

        while let Some((id, result)) = results.next().await {
            let current = self.generation.load(Ordering::SeqCst) == generation;

            match result {
                Ok(explore) => {
                    report.explores_loaded += 1;
                    if current {
                        self.state.send_modify(|state| {
                            state.explores.push(explore);
                            state.progress.record_success();
                        });
                    }
                    debug!(explore = %id, "Explore indexed");
                }
                Err(e) => {
                    warn!(explore = %id, error = %e, "Failed to load explore, skipping");
                    report.explores_failed += 1;
                    report.add_error(LoadError::from_core_error(format!("explore:{}", id), &e));
                    if current {
                        self.state
                            .send_modify(|state| state.progress.record_failure());
                    }
                }
            }

            if current {
                let progress = self.state.borrow().progress;
                session
                    .event_bus()
                    .publish(DataEvent::IndexProgress(progress));
            }
        }

        if self.generation.load(Ordering::SeqCst) == generation {
            session.event_bus().publish(DataEvent::IndexCompleted {
                loaded: report.explores_loaded,
                failed: report.explores_failed,
            });
        } else {
            debug!(generation, "Batch run superseded, final state discarded");
        }

        info!(
            loaded = report.explores_loaded,
            failed = report.explores_failed,
            "Explore index complete"
        );

        report
    }

    /// Fetch the model list through the session, then `run` over it
    ///
    /// A model-list failure is recorded as fatal and leaves the state empty.
    pub async fn index_all<A: LookerApi>(&self, session: &DictionarySession<A>) -> LoadReport {
        match session.all_models().await {
            Ok(models) => self.run(session, &models).await,
            Err(e) => {
                warn!(error = %e, "Failed to load models, nothing to index");
                self.generation.fetch_add(1, Ordering::SeqCst);
                self.state.send_replace(BatchState::default());

                let mut report = LoadReport::new();
                report.add_error(
                    LoadError::from_core_error("models", &e).with_severity(ErrorSeverity::Fatal),
                );
                report
            }
        }
    }
}

/// Fetch the model list, then index every explore with a fresh loader
///
/// A model-list failure is recorded as fatal and yields an empty state.
pub async fn index_all_explores<A: LookerApi>(
    session: &DictionarySession<A>,
) -> (BatchState, LoadReport) {
    let loader = BatchExploreLoader::new();
    let report = loader.index_all(session).await;
    (loader.state(), report)
}
