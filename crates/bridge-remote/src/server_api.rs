//! `ServerApi` over the server's GraphQL endpoint.

use std::sync::RwLock;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::config::{SecretString, ServerConfig};
use crate::error::RemoteError;
use crate::graphql::GraphQlClient;
use crate::remote_traits::{RemoteResult, ServerApi};
use crate::types::{CreateVersionInput, Model, ModelLookup, Project};

/// Page size used when walking a workspace's project list.
const WORKSPACE_PAGE_SIZE: u32 = 100;

const ACTIVE_USER_QUERY: &str = r#"
query ActiveUser {
  activeUser { id name }
}"#;

const PROJECT_QUERY: &str = r#"
query Project($projectId: String!) {
  project(id: $projectId) {
    id name workspaceId updatedAt visibility role sourceApps
  }
}"#;

const MODEL_QUERY: &str = r#"
query Model($projectId: String!, $modelId: String!) {
  project(id: $projectId) {
    model(id: $modelId) { id name }
  }
}"#;

const BRANCH_BY_NAME_QUERY: &str = r#"
query BranchByName($streamId: String!, $name: String!, $commitsLimit: Int!) {
  stream(id: $streamId) {
    branch(name: $name) {
      id name
      commits(limit: $commitsLimit) { totalCount }
    }
  }
}"#;

const MODEL_CREATE_MUTATION: &str = r#"
mutation ModelCreate($input: CreateModelInput!) {
  modelMutations {
    create(input: $input) { id }
  }
}"#;

const VERSION_CREATE_MUTATION: &str = r#"
mutation VersionCreate($input: CreateVersionInput!) {
  versionMutations {
    create(input: $input) { id }
  }
}"#;

const WORKSPACE_PROJECTS_QUERY: &str = r#"
query WorkspaceProjects($workspaceId: String!, $limit: Int!, $cursor: String) {
  workspace(id: $workspaceId) {
    projects(limit: $limit, cursor: $cursor) {
      totalCount
      cursor
      items {
        id name workspaceId updatedAt visibility role sourceApps
      }
    }
  }
}"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActiveUserData {
    active_user: Option<UserRef>,
}

#[derive(Debug, Deserialize)]
struct UserRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ProjectData<T> {
    project: T,
}

#[derive(Debug, Deserialize)]
struct ModelHolder {
    model: Option<Model>,
}

#[derive(Debug, Deserialize)]
struct StreamData {
    stream: Option<BranchHolder>,
}

#[derive(Debug, Deserialize)]
struct BranchHolder {
    branch: Option<Model>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelMutationData {
    model_mutations: CreatedHolder,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionMutationData {
    version_mutations: CreatedHolder,
}

#[derive(Debug, Deserialize)]
struct CreatedHolder {
    create: CreatedRef,
}

#[derive(Debug, Deserialize)]
struct CreatedRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct WorkspaceData {
    workspace: Option<WorkspaceProjects>,
}

#[derive(Debug, Deserialize)]
struct WorkspaceProjects {
    projects: ProjectPage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectPage {
    total_count: usize,
    cursor: Option<String>,
    items: Vec<Project>,
}

/// GraphQL-backed `ServerApi`.
///
/// The client starts anonymous; `authenticate` swaps in a token-bearing
/// client once the token has been validated.
pub struct HttpServerApi {
    client: RwLock<GraphQlClient>,
}

impl HttpServerApi {
    pub fn new(config: ServerConfig) -> RemoteResult<Self> {
        Ok(Self {
            client: RwLock::new(GraphQlClient::new(config)?),
        })
    }

    fn client(&self) -> GraphQlClient {
        self.client
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ServerApi for HttpServerApi {
    async fn authenticate(&self, token: &str) -> RemoteResult<()> {
        if token.trim().is_empty() {
            return Err(RemoteError::Authentication("token is empty".to_string()));
        }

        let config = self
            .client()
            .config()
            .clone()
            .with_token(SecretString::new(token));
        let candidate = GraphQlClient::new(config)?;

        let data: ActiveUserData = candidate
            .execute("activeUser", ACTIVE_USER_QUERY, json!({}))
            .await
            .map_err(|e| match e {
                RemoteError::Authentication(msg) => RemoteError::Authentication(msg),
                other => RemoteError::Authentication(other.to_string()),
            })?;
        let user = data.active_user.ok_or_else(|| {
            RemoteError::Authentication("token is not bound to an active user".to_string())
        })?;
        info!(user_id = %user.id, "authenticated against server");

        *self
            .client
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = candidate;
        Ok(())
    }

    async fn get_project(&self, project_id: &str) -> RemoteResult<Project> {
        let data: ProjectData<Option<Project>> = self
            .client()
            .execute("project", PROJECT_QUERY, json!({ "projectId": project_id }))
            .await?;
        data.project.ok_or_else(|| RemoteError::NotFound {
            kind: "Project",
            id: project_id.to_string(),
        })
    }

    async fn get_model(&self, project_id: &str, model_id: &str) -> RemoteResult<Model> {
        let data: ProjectData<Option<ModelHolder>> = self
            .client()
            .execute(
                "model",
                MODEL_QUERY,
                json!({ "projectId": project_id, "modelId": model_id }),
            )
            .await?;
        data.project
            .and_then(|holder| holder.model)
            .ok_or_else(|| RemoteError::NotFound {
                kind: "Model",
                id: model_id.to_string(),
            })
    }

    async fn get_model_by_name(
        &self,
        project_id: &str,
        name: &str,
        depth: u32,
    ) -> RemoteResult<ModelLookup> {
        let data: StreamData = self
            .client()
            .execute(
                "branchByName",
                BRANCH_BY_NAME_QUERY,
                json!({ "streamId": project_id, "name": name, "commitsLimit": depth }),
            )
            .await?;
        let stream = data.stream.ok_or_else(|| RemoteError::NotFound {
            kind: "Project",
            id: project_id.to_string(),
        })?;
        Ok(match stream.branch {
            Some(model) => ModelLookup::Found(model),
            None => ModelLookup::NotFound,
        })
    }

    async fn create_model(&self, project_id: &str, name: &str) -> RemoteResult<String> {
        let data: ModelMutationData = self
            .client()
            .execute(
                "modelCreate",
                MODEL_CREATE_MUTATION,
                json!({ "input": { "projectId": project_id, "name": name } }),
            )
            .await?;
        debug!(project_id = %project_id, model = %name, "model created");
        Ok(data.model_mutations.create.id)
    }

    async fn create_version(&self, input: CreateVersionInput) -> RemoteResult<String> {
        let data: VersionMutationData = self
            .client()
            .execute(
                "versionCreate",
                VERSION_CREATE_MUTATION,
                json!({ "input": input }),
            )
            .await?;
        Ok(data.version_mutations.create.id)
    }

    async fn workspace_projects(&self, workspace_id: &str) -> RemoteResult<Vec<Project>> {
        let client = self.client();
        let mut projects = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let data: WorkspaceData = client
                .execute(
                    "workspaceProjects",
                    WORKSPACE_PROJECTS_QUERY,
                    json!({
                        "workspaceId": workspace_id,
                        "limit": WORKSPACE_PAGE_SIZE,
                        "cursor": cursor,
                    }),
                )
                .await?;
            let page = data
                .workspace
                .ok_or_else(|| RemoteError::EmptyResponse("workspaceProjects".to_string()))?
                .projects;

            let fetched = page.items.len();
            projects.extend(page.items);
            debug!(
                workspace_id = %workspace_id,
                fetched = fetched,
                total = page.total_count,
                "workspace project page"
            );

            match page.cursor {
                Some(next) if fetched > 0 && projects.len() < page.total_count => {
                    cursor = Some(next)
                }
                _ => break,
            }
        }

        Ok(projects)
    }
}
