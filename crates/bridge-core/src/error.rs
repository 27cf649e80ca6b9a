//! Error taxonomy of the propagation workflow.

use bridge_remote::RemoteError;
use thiserror::Error;

/// One target project that could not be published to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFailure {
    pub project_id: String,
    pub project_name: String,
    pub error: String,
}

impl std::fmt::Display for ProjectFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.project_name, self.project_id, self.error)
    }
}

/// Errors produced while propagating a version across projects.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Token missing or rejected. Raised before any project is touched.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A resolved model has no usable identifier.
    #[error("Cannot use the model '{model_name}' in project {project_id} without its id")]
    DataIntegrity {
        project_id: String,
        model_name: String,
    },

    /// The target model is one of the models that triggered this run.
    #[error(
        "The target model: {model_name} cannot match the model that triggered this automation: {trigger_model_id}"
    )]
    Conflict {
        model_name: String,
        trigger_model_id: String,
    },

    /// Creating the destination model failed.
    #[error("could not create model '{model_name}' in project {project_id}: {reason}")]
    Resolution {
        project_id: String,
        model_name: String,
        reason: String,
    },

    /// Object graph transfer failed.
    #[error("transfer to project {project_id} failed: {reason}")]
    Transfer { project_id: String, reason: String },

    /// Any other remote service failure.
    #[error("remote service error: {0}")]
    RemoteService(String),

    /// The workspace listing came back without data.
    #[error("workspace project query returned no data for workspace {workspace_id}: {reason}")]
    GraphQlQuery {
        workspace_id: String,
        reason: String,
    },

    /// The run context is unusable (no trigger, origin outside a workspace, ...).
    #[error("invalid run context: {0}")]
    Context(String),

    /// Best-effort run finished with failed projects.
    #[error(
        "publishing failed for {} of {total} projects: {}",
        .failures.len(),
        .failures.iter().map(|f| f.to_string()).collect::<Vec<_>>().join("; ")
    )]
    PartialFailure {
        total: usize,
        failures: Vec<ProjectFailure>,
    },
}

impl From<RemoteError> for BridgeError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Authentication(msg) => BridgeError::Authentication(msg),
            other => BridgeError::RemoteService(other.to_string()),
        }
    }
}

/// Convenience result alias.
pub type BridgeResult<T> = std::result::Result<T, BridgeError>;
