//! Model lookup and model detail loading
//!
//! Unlike the batch index, a model detail is all-or-nothing: one failed
//! explore fails the whole call.

use crate::api::LookerApi;
use crate::error::CoreError;
use crate::models::{LookmlModel, ModelDetail};
use crate::session::DictionarySession;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// First model named `model_name` in the (cached) model list
pub async fn load_model<A: LookerApi>(
    session: &DictionarySession<A>,
    model_name: &str,
) -> Result<Arc<LookmlModel>, CoreError> {
    let models = session.all_models().await?;

    models
        .iter()
        .find(|m| m.name == model_name)
        .map(|m| Arc::new(m.clone()))
        .ok_or_else(|| CoreError::ModelNotFound {
            model: model_name.to_string(),
        })
}

/// Resolve a model and fetch all of its explores in parallel
///
/// Every fetch runs to completion (successful ones stay cached) before the
/// result is decided; the first failure in explore order is returned.
pub async fn load_model_detail<A: LookerApi>(
    session: &DictionarySession<A>,
    model_name: &str,
) -> Result<ModelDetail, CoreError> {
    let model = load_model(session, model_name).await?;

    debug!(
        model = %model.name,
        explores = model.explores.len(),
        "Loading model detail"
    );

    let fetches = model
        .explores
        .iter()
        .map(|explore| session.explore(&model.name, &explore.name));

    let explores = join_all(fetches)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .inspect_err(|e| warn!(model = %model.name, error = %e, "Model detail failed"))?;

    Ok(ModelDetail { model, explores })
}
