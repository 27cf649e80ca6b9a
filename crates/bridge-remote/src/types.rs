//! Wire types shared by the remote service, the transport and the run context.
//!
//! Field names follow the camelCase shape of the GraphQL API and of the
//! automation run-data document handed over by the host runner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Source application recorded on every version this system creates.
pub const SOURCE_APPLICATION: &str = "automation-bridge";

/// A project as listed by the remote service. Read-only for this system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub workspace_id: Option<String>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub source_apps: Vec<String>,
}

/// A model (branch) inside a project.
///
/// `id` is optional because the legacy branch lookup can hand back a model
/// without a usable identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

impl Model {
    /// Non-empty identifier, if any.
    pub fn resolved_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Outcome of looking a model up by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelLookup {
    Found(Model),
    NotFound,
}

/// Payload of a version-creation trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerPayload {
    pub model_id: String,
    #[serde(default)]
    pub version_id: Option<String>,
}

/// What caused the current automation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    #[serde(default = "default_trigger_type")]
    pub trigger_type: String,
    pub payload: TriggerPayload,
}

fn default_trigger_type() -> String {
    "versionCreation".to_string()
}

impl Trigger {
    pub fn version_created(model_id: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self {
            trigger_type: default_trigger_type(),
            payload: TriggerPayload {
                model_id: model_id.into(),
                version_id: Some(version_id.into()),
            },
        }
    }
}

/// Immutable metadata of one automation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationRunData {
    pub project_id: String,
    #[serde(default)]
    pub speckle_server_url: String,
    #[serde(default)]
    pub automation_id: String,
    #[serde(default)]
    pub automation_run_id: String,
    #[serde(default)]
    pub function_run_id: String,
    pub triggers: Vec<Trigger>,
}

/// Input of the version-creation mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVersionInput {
    pub project_id: String,
    pub object_id: String,
    pub model_id: String,
    pub message: String,
    pub source_application: String,
}

/// Root of a transferable object graph.
///
/// `objects` is the full closure with the root object first. The content is
/// never interpreted here, only moved between projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootObject {
    pub id: String,
    pub objects: Vec<serde_json::Value>,
}

impl RootObject {
    /// Wrap a single object, assigning a content id when the
    /// object does not carry one.
    pub fn from_value(mut value: serde_json::Value) -> Self {
        let id = match value.get("id").and_then(|v| v.as_str()) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let id = object_hash(&value);
                if let Some(map) = value.as_object_mut() {
                    map.insert("id".to_string(), serde_json::Value::String(id.clone()));
                }
                id
            }
        };
        Self {
            id,
            objects: vec![value],
        }
    }

    /// Build from a downloaded closure. The first element is the root.
    pub fn from_closure(objects: Vec<serde_json::Value>) -> Option<Self> {
        let id = objects.first()?.get("id")?.as_str()?.to_string();
        Some(Self { id, objects })
    }
}

/// Content hash of an object: first 32 hex chars of SHA-256 over its JSON.
///
/// `serde_json` maps keep keys sorted, so equal content always serializes
/// identically.
pub fn object_hash(value: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.to_string().as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..32].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn project_deserializes_from_graphql_shape() {
        let project: Project = serde_json::from_value(json!({
            "id": "p1",
            "name": "Tower",
            "workspaceId": "ws1",
            "updatedAt": "2026-10-19T10:00:00Z",
            "visibility": "PRIVATE",
            "role": "stream:owner",
            "sourceApps": ["Revit"]
        }))
        .unwrap();
        assert_eq!(project.workspace_id.as_deref(), Some("ws1"));
        assert_eq!(project.source_apps, vec!["Revit".to_string()]);
    }

    #[test]
    fn model_without_id_has_no_resolved_id() {
        let model = Model {
            id: Some(String::new()),
            name: "main".to_string(),
        };
        assert!(model.resolved_id().is_none());
    }

    #[test]
    fn run_data_parses_host_document() {
        let data: AutomationRunData = serde_json::from_value(json!({
            "projectId": "origin",
            "speckleServerUrl": "https://app.speckle.systems",
            "automationId": "a1",
            "automationRunId": "r1",
            "functionRunId": "f1",
            "triggers": [
                {"triggerType": "versionCreation", "payload": {"modelId": "m1", "versionId": "v1"}}
            ]
        }))
        .unwrap();
        assert_eq!(data.triggers.len(), 1);
        assert_eq!(data.triggers[0].payload.model_id, "m1");
    }

    #[test]
    fn root_object_hash_is_stable_and_stamped() {
        let a = RootObject::from_value(json!({"speckle_type": "Base", "height": 3}));
        let b = RootObject::from_value(json!({"height": 3, "speckle_type": "Base"}));
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.len(), 32);
        assert_eq!(a.objects[0]["id"], json!(a.id));
    }

    #[test]
    fn root_object_keeps_existing_id() {
        let root = RootObject::from_value(json!({"id": "abc", "speckle_type": "Base"}));
        assert_eq!(root.id, "abc");
    }

    #[test]
    fn closure_without_root_id_is_rejected() {
        assert!(RootObject::from_closure(vec![]).is_none());
        assert!(RootObject::from_closure(vec![json!({"x": 1})]).is_none());
    }
}
