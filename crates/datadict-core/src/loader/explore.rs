//! Single explore loader with a "currently loading" indicator

use crate::api::LookerApi;
use crate::error::CoreError;
use crate::event::DataEvent;
use crate::models::{ExploreId, LookmlExplore};
use crate::session::DictionarySession;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Observable state of the explore loader
#[derive(Debug, Clone, Default)]
pub struct ExploreState {
    /// Explore whose fetch is outstanding, if any
    pub loading_explore: Option<ExploreId>,
    /// Most recently loaded explore
    pub current_explore: Option<Arc<LookmlExplore>>,
}

impl ExploreState {
    pub fn is_loading(&self) -> bool {
        self.loading_explore.is_some()
    }
}

/// Loads one explore at a time for display
pub struct ExploreLoader {
    state: watch::Sender<ExploreState>,
}

impl Default for ExploreLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears `loading_explore` when the load finishes or its future is dropped
struct LoadingGuard<'a> {
    state: &'a watch::Sender<ExploreState>,
    id: ExploreId,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        // A newer load may have taken over the indicator
        self.state.send_if_modified(|state| {
            if state.loading_explore.as_ref() == Some(&self.id) {
                state.loading_explore = None;
                true
            } else {
                false
            }
        });
    }
}

impl ExploreLoader {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ExploreState::default());
        Self { state }
    }

    pub fn subscribe(&self) -> watch::Receiver<ExploreState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ExploreState {
        self.state.borrow().clone()
    }

    /// Load one explore through the session cache
    ///
    /// `loading_explore` is set for the duration of the call and cleared on
    /// success and failure alike. On success the explore becomes
    /// `current_explore`; on failure the previous one is kept.
    pub async fn load<A: LookerApi>(
        &self,
        session: &DictionarySession<A>,
        model_name: &str,
        explore_name: &str,
    ) -> Result<Arc<LookmlExplore>, CoreError> {
        let id = ExploreId::new(model_name, explore_name);
        self.state
            .send_modify(|state| state.loading_explore = Some(id.clone()));
        let _guard = LoadingGuard {
            state: &self.state,
            id: id.clone(),
        };

        match session.explore(model_name, explore_name).await {
            Ok(explore) => {
                debug!(explore = %id, fields = explore.fields.len(), "Explore loaded");
                self.state
                    .send_modify(|state| state.current_explore = Some(Arc::clone(&explore)));
                session.event_bus().publish(DataEvent::ExploreLoaded(id));
                Ok(explore)
            }
            Err(e) => {
                warn!(explore = %id, error = %e, "Failed to load explore");
                session.event_bus().publish(DataEvent::ExploreFailed {
                    id,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }
}
