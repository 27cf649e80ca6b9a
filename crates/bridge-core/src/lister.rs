//! Workspace project listing.

use std::sync::Arc;

use bridge_remote::{Project, RemoteError, ServerApi};

use crate::error::{BridgeError, BridgeResult};

/// Lists every project of a workspace, in server order.
pub struct WorkspaceProjectLister {
    api: Arc<dyn ServerApi>,
}

impl WorkspaceProjectLister {
    pub fn new(api: Arc<dyn ServerApi>) -> Self {
        Self { api }
    }

    /// A listing without data means the run cannot continue.
    pub async fn list(&self, workspace_id: &str) -> BridgeResult<Vec<Project>> {
        self.api
            .workspace_projects(workspace_id)
            .await
            .map_err(|e| match e {
                RemoteError::EmptyResponse(reason) => BridgeError::GraphQlQuery {
                    workspace_id: workspace_id.to_string(),
                    reason,
                },
                other => other.into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_remote::fakes::MemoryServer;
    use chrono::Utc;

    fn project(id: &str, workspace: &str) -> Project {
        Project {
            id: id.to_string(),
            name: id.to_string(),
            workspace_id: Some(workspace.to_string()),
            updated_at: Utc::now(),
            visibility: None,
            role: None,
            source_apps: vec![],
        }
    }

    #[tokio::test]
    async fn lists_workspace_projects() {
        let server = Arc::new(
            MemoryServer::new()
                .with_project(project("a", "w"))
                .with_project(project("b", "w")),
        );
        let lister = WorkspaceProjectLister::new(server);
        assert_eq!(lister.list("w").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_data_is_graphql_query_error() {
        let server = Arc::new(MemoryServer::new().without_workspace_data());
        let lister = WorkspaceProjectLister::new(server);
        let err = lister.list("w").await.unwrap_err();
        assert!(matches!(
            err,
            BridgeError::GraphQlQuery { workspace_id, .. } if workspace_id == "w"
        ));
    }
}
