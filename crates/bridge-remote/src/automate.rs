//! Automation run context backed by the server.
//!
//! Receives the triggering version's object graph and reports the run status
//! back through the `automateFunctionRunStatusReport` mutation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::RemoteError;
use crate::graphql::GraphQlClient;
use crate::remote_traits::{ObjectTransport, RemoteResult, RunContext};
use crate::transport::ServerTransport;
use crate::types::{AutomationRunData, RootObject};

const VERSION_OBJECT_QUERY: &str = r#"
query VersionObject($projectId: String!, $versionId: String!) {
  project(id: $projectId) {
    version(id: $versionId) { id referencedObject }
  }
}"#;

const STATUS_REPORT_MUTATION: &str = r#"
mutation AutomateFunctionRunStatusReport(
  $projectId: String!
  $functionRunId: String!
  $status: AutomateRunStatus!
  $statusMessage: String
  $results: JSONObject
) {
  automateFunctionRunStatusReport(input: {
    projectId: $projectId
    functionRunId: $functionRunId
    status: $status
    statusMessage: $statusMessage
    results: $results
  })
}"#;

/// Terminal status of a function run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionRunStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Deserialize)]
struct VersionData {
    project: Option<VersionHolder>,
}

#[derive(Debug, Deserialize)]
struct VersionHolder {
    version: Option<VersionRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionRef {
    referenced_object: String,
}

/// Build the `results` document attached to a status report.
fn results_payload(version_ids: &[String]) -> serde_json::Value {
    json!({
        "version": 1,
        "values": {
            "objectResults": [],
            "blobIds": [],
            "resultVersions": version_ids,
        }
    })
}

/// `RunContext` talking to the server that started the run.
pub struct AutomateRunContext {
    run_data: AutomationRunData,
    client: GraphQlClient,
    transport: Arc<dyn ObjectTransport>,
}

impl AutomateRunContext {
    /// Connect with `config`, which carries the automation token the host
    /// runner handed over. Objects move through a `ServerTransport` built
    /// from the same config.
    pub fn connect(run_data: AutomationRunData, config: ServerConfig) -> RemoteResult<Self> {
        let transport = Arc::new(ServerTransport::new(config.clone())?);
        Self::with_transport(run_data, config, transport)
    }

    pub fn with_transport(
        run_data: AutomationRunData,
        config: ServerConfig,
        transport: Arc<dyn ObjectTransport>,
    ) -> RemoteResult<Self> {
        Ok(Self {
            run_data,
            client: GraphQlClient::new(config)?,
            transport,
        })
    }

    async fn report(
        &self,
        status: FunctionRunStatus,
        message: &str,
        version_ids: &[String],
    ) -> RemoteResult<()> {
        let _: serde_json::Value = self
            .client
            .execute(
                "automateFunctionRunStatusReport",
                STATUS_REPORT_MUTATION,
                json!({
                    "projectId": self.run_data.project_id,
                    "functionRunId": self.run_data.function_run_id,
                    "status": status,
                    "statusMessage": message,
                    "results": results_payload(version_ids),
                }),
            )
            .await?;
        info!(
            status = ?status,
            function_run_id = %self.run_data.function_run_id,
            "run status reported"
        );
        Ok(())
    }
}

#[async_trait]
impl RunContext for AutomateRunContext {
    fn run_data(&self) -> &AutomationRunData {
        &self.run_data
    }

    async fn receive_triggering_object(&self) -> RemoteResult<RootObject> {
        let trigger = self.run_data.triggers.first().ok_or_else(|| {
            RemoteError::Config("automation run data carries no trigger".to_string())
        })?;
        let version_id = trigger.payload.version_id.as_deref().ok_or_else(|| {
            RemoteError::Config("triggering version id is missing".to_string())
        })?;

        let data: VersionData = self
            .client
            .execute(
                "versionObject",
                VERSION_OBJECT_QUERY,
                json!({ "projectId": self.run_data.project_id, "versionId": version_id }),
            )
            .await?;
        let object_id = data
            .project
            .and_then(|p| p.version)
            .map(|v| v.referenced_object)
            .ok_or_else(|| RemoteError::NotFound {
                kind: "Version",
                id: version_id.to_string(),
            })?;

        self.transport
            .receive(&self.run_data.project_id, &object_id)
            .await
    }

    async fn report_success(&self, message: &str, version_ids: &[String]) -> RemoteResult<()> {
        self.report(FunctionRunStatus::Succeeded, message, version_ids)
            .await
    }

    async fn report_failure(&self, message: &str) -> RemoteResult<()> {
        warn!(message = %message, "reporting run failure");
        self.report(FunctionRunStatus::Failed, message, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_in_screaming_case() {
        assert_eq!(
            serde_json::to_value(FunctionRunStatus::Succeeded).unwrap(),
            json!("SUCCEEDED")
        );
        assert_eq!(
            serde_json::to_value(FunctionRunStatus::Failed).unwrap(),
            json!("FAILED")
        );
    }

    #[test]
    fn results_payload_lists_versions() {
        let payload = results_payload(&["v1".to_string(), "v2".to_string()]);
        assert_eq!(payload["values"]["resultVersions"], json!(["v1", "v2"]));
        assert_eq!(payload["version"], json!(1));
    }
}
