//! Destination model resolution.
//!
//! Finds the model named like the triggering one in a destination project,
//! or creates it. A model that is itself a trigger of the current run is
//! refused: publishing into it would re-trigger the automation and loop.

use std::sync::Arc;

use bridge_remote::{ModelLookup, ServerApi, Trigger};
use crate::error::{BridgeError, BridgeResult};
use crate::obs;

/// Versions loaded alongside a model lookup; only existence matters here.
const LOOKUP_DEPTH: u32 = 1;

/// Resolves (or lazily creates) the model to publish into.
pub struct ModelResolver {
    api: Arc<dyn ServerApi>,
}

impl ModelResolver {
    pub fn new(api: Arc<dyn ServerApi>) -> Self {
        Self { api }
    }

    /// Resolve `model_name` in `project_id` to a non-empty model id.
    pub async fn resolve(
        &self,
        project_id: &str,
        model_name: &str,
        triggers: &[Trigger],
    ) -> BridgeResult<String> {
        match self
            .api
            .get_model_by_name(project_id, model_name, LOOKUP_DEPTH)
            .await?
        {
            ModelLookup::Found(model) => {
                let model_id =
                    model
                        .resolved_id()
                        .ok_or_else(|| BridgeError::DataIntegrity {
                            project_id: project_id.to_string(),
                            model_name: model_name.to_string(),
                        })?;

                if let Some(trigger) = triggers.iter().find(|t| t.payload.model_id == model_id) {
                    return Err(BridgeError::Conflict {
                        model_name: model_name.to_string(),
                        trigger_model_id: trigger.payload.model_id.clone(),
                    });
                }

                obs::emit_model_resolved(project_id, model_id, false);
                Ok(model_id.to_string())
            }
            ModelLookup::NotFound => {
                let created = self
                    .api
                    .create_model(project_id, model_name)
                    .await
                    .map_err(|e| BridgeError::Resolution {
                        project_id: project_id.to_string(),
                        model_name: model_name.to_string(),
                        reason: e.to_string(),
                    })?;
                if created.is_empty() {
                    return Err(BridgeError::Resolution {
                        project_id: project_id.to_string(),
                        model_name: model_name.to_string(),
                        reason: "server returned an empty model id".to_string(),
                    });
                }
                obs::emit_model_resolved(project_id, &created, true);
                Ok(created)
            }
        }
    }
}
