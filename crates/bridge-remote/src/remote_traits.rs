//! Collaborator trait definitions
//!
//! These traits are the seams between the propagation workflow and the
//! outside world:
//! - `ServerApi`: GraphQL operations against the collaboration server
//! - `ObjectTransport`: content-addressed object graph upload/download
//! - `RunContext`: trigger metadata and the run's result channel
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::types::{AutomationRunData, CreateVersionInput, Model, ModelLookup, Project, RootObject};

/// Result type for collaborator operations
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

// ---------------------------------------------------------------------------
// ServerApi
// ---------------------------------------------------------------------------

/// Remote collaboration server.
///
/// Guarantees:
/// - `get_model_by_name` distinguishes "absent" (`ModelLookup::NotFound`)
///   from a failed query (`Err`).
/// - `workspace_projects` returns every project of the workspace in the
///   order the server lists them; paging is handled by the implementation.
#[async_trait]
pub trait ServerApi: Send + Sync {
    /// Validate the token and bind the client to its user.
    async fn authenticate(&self, token: &str) -> RemoteResult<()>;

    /// Fetch a project by id.
    async fn get_project(&self, project_id: &str) -> RemoteResult<Project>;

    /// Fetch a model by id within a project.
    async fn get_model(&self, project_id: &str, model_id: &str) -> RemoteResult<Model>;

    /// Look a model up by name, loading at most `depth` of its versions.
    async fn get_model_by_name(
        &self,
        project_id: &str,
        name: &str,
        depth: u32,
    ) -> RemoteResult<ModelLookup>;

    /// Create a model and return its generated id.
    async fn create_model(&self, project_id: &str, name: &str) -> RemoteResult<String>;

    /// Record a new version and return its id.
    async fn create_version(&self, input: CreateVersionInput) -> RemoteResult<String>;

    /// List all projects of a workspace.
    async fn workspace_projects(&self, workspace_id: &str) -> RemoteResult<Vec<Project>>;
}

// ---------------------------------------------------------------------------
// ObjectTransport
// ---------------------------------------------------------------------------

/// Object graph transfer.
///
/// Guarantees:
/// - `send` returns the root object's content id; sending identical content
///   twice yields the same id.
#[async_trait]
pub trait ObjectTransport: Send + Sync {
    /// Upload the object graph into `project_id`, returning the root id.
    async fn send(&self, root: &RootObject, project_id: &str) -> RemoteResult<String>;

    /// Download the object graph rooted at `object_id` from `project_id`.
    async fn receive(&self, project_id: &str, object_id: &str) -> RemoteResult<RootObject>;
}

// ---------------------------------------------------------------------------
// RunContext
// ---------------------------------------------------------------------------

/// The automation run this process was started for.
///
/// Guarantees:
/// - Exactly one of `report_success` / `report_failure` is called per run by
///   a well-behaved caller.
#[async_trait]
pub trait RunContext: Send + Sync {
    /// Run metadata (origin project, triggers).
    fn run_data(&self) -> &AutomationRunData;

    /// Receive the root object of the triggering version.
    async fn receive_triggering_object(&self) -> RemoteResult<RootObject>;

    /// Mark the run as succeeded, attaching the created version ids.
    async fn report_success(&self, message: &str, version_ids: &[String]) -> RemoteResult<()>;

    /// Mark the run as failed.
    async fn report_failure(&self, message: &str) -> RemoteResult<()>;
}
