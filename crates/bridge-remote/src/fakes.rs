//! In-memory fakes for collaborator traits (testing only)
//!
//! Provides `MemoryServer` (both `ServerApi` and `ObjectTransport`) and
//! `MemoryRunContext` that satisfy the trait contracts without any network.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::remote_traits::*;
use crate::types::*;

fn short_id(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &id[..10])
}

// ---------------------------------------------------------------------------
// MemoryServer
// ---------------------------------------------------------------------------

/// A version recorded by [`MemoryServer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedVersion {
    pub id: String,
    pub input: CreateVersionInput,
}

#[derive(Debug, Default)]
struct ServerState {
    accepted_token: Option<String>,
    authenticated: bool,
    projects: Vec<Project>,
    models: HashMap<String, Vec<Model>>,
    objects: HashMap<String, HashMap<String, Vec<serde_json::Value>>>,
    versions: Vec<RecordedVersion>,
    sends: Vec<(String, String)>,
    models_created: u32,
    workspace_without_data: bool,
    fail_model_creation: HashSet<String>,
    fail_version_creation: HashSet<String>,
    fail_send: HashSet<String>,
}

/// In-memory server holding projects, models, objects and versions.
#[derive(Debug, Default)]
pub struct MemoryServer {
    state: Mutex<ServerState>,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept this token in `authenticate` (default: any non-empty token).
    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.state.lock().unwrap().accepted_token = Some(token.into());
        self
    }

    /// Register a project. Listing order follows registration order.
    pub fn with_project(self, project: Project) -> Self {
        self.state.lock().unwrap().projects.push(project);
        self
    }

    /// Register an existing model in a project.
    pub fn with_model(self, project_id: &str, model: Model) -> Self {
        self.state
            .lock()
            .unwrap()
            .models
            .entry(project_id.to_string())
            .or_default()
            .push(model);
        self
    }

    /// Store an object graph so it can be received.
    pub fn with_object(self, project_id: &str, root: &RootObject) -> Self {
        self.state
            .lock()
            .unwrap()
            .objects
            .entry(project_id.to_string())
            .or_default()
            .insert(root.id.clone(), root.objects.clone());
        self
    }

    /// Make workspace listing answer without data.
    pub fn without_workspace_data(self) -> Self {
        self.state.lock().unwrap().workspace_without_data = true;
        self
    }

    pub fn fail_model_creation_in(self, project_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .fail_model_creation
            .insert(project_id.to_string());
        self
    }

    pub fn fail_version_creation_in(self, project_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .fail_version_creation
            .insert(project_id.to_string());
        self
    }

    pub fn fail_send_to(self, project_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .fail_send
            .insert(project_id.to_string());
        self
    }

    /// All versions created so far, in creation order.
    pub fn versions(&self) -> Vec<RecordedVersion> {
        self.state.lock().unwrap().versions.clone()
    }

    /// Versions created in one project.
    pub fn versions_in(&self, project_id: &str) -> Vec<RecordedVersion> {
        self.versions()
            .into_iter()
            .filter(|v| v.input.project_id == project_id)
            .collect()
    }

    /// Models currently present in a project.
    pub fn models_in(&self, project_id: &str) -> Vec<Model> {
        self.state
            .lock()
            .unwrap()
            .models
            .get(project_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of `create_model` calls that succeeded.
    pub fn models_created(&self) -> u32 {
        self.state.lock().unwrap().models_created
    }

    /// `(project_id, object_id)` of every `send`, in call order.
    pub fn sends(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().sends.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock().unwrap().authenticated
    }

    fn require_project(state: &ServerState, project_id: &str) -> RemoteResult<()> {
        if state.projects.iter().any(|p| p.id == project_id) {
            Ok(())
        } else {
            Err(RemoteError::NotFound {
                kind: "Project",
                id: project_id.to_string(),
            })
        }
    }
}

#[async_trait]
impl ServerApi for MemoryServer {
    async fn authenticate(&self, token: &str) -> RemoteResult<()> {
        let mut state = self.state.lock().unwrap();
        let accepted = match &state.accepted_token {
            Some(expected) => expected == token,
            None => !token.trim().is_empty(),
        };
        if !accepted {
            return Err(RemoteError::Authentication(
                "token is not bound to an active user".to_string(),
            ));
        }
        state.authenticated = true;
        Ok(())
    }

    async fn get_project(&self, project_id: &str) -> RemoteResult<Project> {
        let state = self.state.lock().unwrap();
        state
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound {
                kind: "Project",
                id: project_id.to_string(),
            })
    }

    async fn get_model(&self, project_id: &str, model_id: &str) -> RemoteResult<Model> {
        let state = self.state.lock().unwrap();
        state
            .models
            .get(project_id)
            .and_then(|models| {
                models
                    .iter()
                    .find(|m| m.id.as_deref() == Some(model_id))
                    .cloned()
            })
            .ok_or_else(|| RemoteError::NotFound {
                kind: "Model",
                id: model_id.to_string(),
            })
    }

    async fn get_model_by_name(
        &self,
        project_id: &str,
        name: &str,
        _depth: u32,
    ) -> RemoteResult<ModelLookup> {
        let state = self.state.lock().unwrap();
        Self::require_project(&state, project_id)?;
        Ok(state
            .models
            .get(project_id)
            .and_then(|models| models.iter().find(|m| m.name == name).cloned())
            .map(ModelLookup::Found)
            .unwrap_or(ModelLookup::NotFound))
    }

    async fn create_model(&self, project_id: &str, name: &str) -> RemoteResult<String> {
        let mut state = self.state.lock().unwrap();
        Self::require_project(&state, project_id)?;
        if state.fail_model_creation.contains(project_id) {
            return Err(RemoteError::GraphQl {
                messages: vec![format!("You do not have access to project {}", project_id)],
            });
        }
        let models = state.models.entry(project_id.to_string()).or_default();
        if models.iter().any(|m| m.name == name) {
            return Err(RemoteError::GraphQl {
                messages: vec![format!("A model named '{}' already exists", name)],
            });
        }
        let id = short_id("model");
        models.push(Model {
            id: Some(id.clone()),
            name: name.to_string(),
        });
        state.models_created += 1;
        Ok(id)
    }

    async fn create_version(&self, input: CreateVersionInput) -> RemoteResult<String> {
        let mut state = self.state.lock().unwrap();
        Self::require_project(&state, &input.project_id)?;
        if state.fail_version_creation.contains(&input.project_id) {
            return Err(RemoteError::GraphQl {
                messages: vec![format!(
                    "Version creation rejected in project {}",
                    input.project_id
                )],
            });
        }
        let stored = state
            .objects
            .get(&input.project_id)
            .is_some_and(|objects| objects.contains_key(&input.object_id));
        if !stored {
            return Err(RemoteError::GraphQl {
                messages: vec![format!("Object {} not found", input.object_id)],
            });
        }
        let id = short_id("version");
        state.versions.push(RecordedVersion {
            id: id.clone(),
            input,
        });
        Ok(id)
    }

    async fn workspace_projects(&self, workspace_id: &str) -> RemoteResult<Vec<Project>> {
        let state = self.state.lock().unwrap();
        if state.workspace_without_data {
            return Err(RemoteError::EmptyResponse("workspaceProjects".to_string()));
        }
        Ok(state
            .projects
            .iter()
            .filter(|p| p.workspace_id.as_deref() == Some(workspace_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ObjectTransport for MemoryServer {
    async fn send(&self, root: &RootObject, project_id: &str) -> RemoteResult<String> {
        let mut state = self.state.lock().unwrap();
        if state.fail_send.contains(project_id) {
            return Err(RemoteError::Transfer(format!(
                "upload to project {} failed with HTTP 503",
                project_id
            )));
        }
        state
            .objects
            .entry(project_id.to_string())
            .or_default()
            .insert(root.id.clone(), root.objects.clone());
        state
            .sends
            .push((project_id.to_string(), root.id.clone()));
        Ok(root.id.clone())
    }

    async fn receive(&self, project_id: &str, object_id: &str) -> RemoteResult<RootObject> {
        let state = self.state.lock().unwrap();
        let objects = state
            .objects
            .get(project_id)
            .and_then(|objects| objects.get(object_id))
            .cloned()
            .ok_or_else(|| RemoteError::NotFound {
                kind: "Object",
                id: object_id.to_string(),
            })?;
        Ok(RootObject {
            id: object_id.to_string(),
            objects,
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryRunContext
// ---------------------------------------------------------------------------

/// Outcome captured by [`MemoryRunContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedOutcome {
    Success {
        message: String,
        version_ids: Vec<String>,
    },
    Failure {
        message: String,
    },
}

/// In-memory run context holding the triggering object and every report.
#[derive(Debug)]
pub struct MemoryRunContext {
    run_data: AutomationRunData,
    root: Option<RootObject>,
    reports: Mutex<Vec<ReportedOutcome>>,
}

impl MemoryRunContext {
    pub fn new(run_data: AutomationRunData, root: RootObject) -> Self {
        Self {
            run_data,
            root: Some(root),
            reports: Mutex::new(Vec::new()),
        }
    }

    /// A context whose triggering object cannot be received.
    pub fn without_object(run_data: AutomationRunData) -> Self {
        Self {
            run_data,
            root: None,
            reports: Mutex::new(Vec::new()),
        }
    }

    /// Every report made so far.
    pub fn reports(&self) -> Vec<ReportedOutcome> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl RunContext for MemoryRunContext {
    fn run_data(&self) -> &AutomationRunData {
        &self.run_data
    }

    async fn receive_triggering_object(&self) -> RemoteResult<RootObject> {
        self.root.clone().ok_or_else(|| RemoteError::NotFound {
            kind: "Object",
            id: "triggering version".to_string(),
        })
    }

    async fn report_success(&self, message: &str, version_ids: &[String]) -> RemoteResult<()> {
        self.reports.lock().unwrap().push(ReportedOutcome::Success {
            message: message.to_string(),
            version_ids: version_ids.to_vec(),
        });
        Ok(())
    }

    async fn report_failure(&self, message: &str) -> RemoteResult<()> {
        self.reports.lock().unwrap().push(ReportedOutcome::Failure {
            message: message.to_string(),
        });
        Ok(())
    }
}
