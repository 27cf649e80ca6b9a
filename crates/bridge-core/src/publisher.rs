//! Version publishing into a destination project.

use std::sync::Arc;

use bridge_remote::{
    CreateVersionInput, ObjectTransport, RemoteError, RootObject, ServerApi, SOURCE_APPLICATION,
};
use tracing::debug;

use crate::error::{BridgeError, BridgeResult};
use crate::obs;
use crate::result::RunResult;

/// Transfers the root object into a project and records a version for it.
pub struct VersionPublisher {
    api: Arc<dyn ServerApi>,
    transport: Arc<dyn ObjectTransport>,
    origin_project_id: String,
}

impl VersionPublisher {
    pub fn new(
        api: Arc<dyn ServerApi>,
        transport: Arc<dyn ObjectTransport>,
        origin_project_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            transport,
            origin_project_id: origin_project_id.into(),
        }
    }

    /// Publish `root` as a new version of `model_id` in `project_id`.
    ///
    /// Returns `Ok(None)` without touching anything when `project_id` is the
    /// origin project. Failures are never retried.
    pub async fn publish(
        &self,
        project_id: &str,
        model_id: &str,
        root: &RootObject,
        message: &str,
        result: &mut RunResult,
    ) -> BridgeResult<Option<String>> {
        if project_id == self.origin_project_id {
            debug!(project_id = %project_id, "skipping origin project");
            return Ok(None);
        }

        let object_id = self
            .transport
            .send(root, project_id)
            .await
            .map_err(|e| match e {
                RemoteError::Authentication(msg) => BridgeError::Authentication(msg),
                other => BridgeError::Transfer {
                    project_id: project_id.to_string(),
                    reason: other.to_string(),
                },
            })?;

        let version_id = self
            .api
            .create_version(CreateVersionInput {
                project_id: project_id.to_string(),
                object_id: object_id.clone(),
                model_id: model_id.to_string(),
                message: message.to_string(),
                source_application: SOURCE_APPLICATION.to_string(),
            })
            .await?;

        obs::emit_version_published(project_id, model_id, &object_id, &version_id);
        result.record_version(version_id.clone());
        Ok(Some(version_id))
    }
}
