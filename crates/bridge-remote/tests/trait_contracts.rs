//! Trait contract tests for ServerApi, ObjectTransport and RunContext.
//!
//! These tests pin the behavioral contracts the propagation workflow relies
//! on, using the in-memory fakes. Any conforming implementation must pass them.

use bridge_remote::fakes::{MemoryRunContext, MemoryServer, ReportedOutcome};
use bridge_remote::*;
use chrono::Utc;
use serde_json::json;

fn project(id: &str, workspace: &str) -> Project {
    Project {
        id: id.to_string(),
        name: format!("Project {}", id),
        workspace_id: Some(workspace.to_string()),
        updated_at: Utc::now(),
        visibility: None,
        role: None,
        source_apps: vec![],
    }
}

fn version_input(project_id: &str, object_id: &str, model_id: &str) -> CreateVersionInput {
    CreateVersionInput {
        project_id: project_id.to_string(),
        object_id: object_id.to_string(),
        model_id: model_id.to_string(),
        message: String::new(),
        source_application: SOURCE_APPLICATION.to_string(),
    }
}

// ===========================================================================
// ServerApi contract tests
// ===========================================================================

#[tokio::test]
async fn authenticate_rejects_wrong_token() {
    let server = MemoryServer::new().with_token("good");
    let err = server.authenticate("bad").await.unwrap_err();

    assert!(matches!(err, RemoteError::Authentication(_)));
    assert!(!server.is_authenticated());
    server.authenticate("good").await.unwrap();
    assert!(server.is_authenticated());
}

#[tokio::test]
async fn model_lookup_distinguishes_absent_from_error() {
    let server = MemoryServer::new().with_project(project("p1", "w"));

    let absent = server.get_model_by_name("p1", "main", 1).await.unwrap();
    assert_eq!(absent, ModelLookup::NotFound);

    let err = server.get_model_by_name("missing", "main", 1).await.unwrap_err();
    assert!(matches!(err, RemoteError::NotFound { .. }));
}

#[tokio::test]
async fn created_model_is_found_by_name() {
    let server = MemoryServer::new().with_project(project("p1", "w"));
    let id = server.create_model("p1", "facade").await.unwrap();

    match server.get_model_by_name("p1", "facade", 1).await.unwrap() {
        ModelLookup::Found(model) => assert_eq!(model.id.as_deref(), Some(id.as_str())),
        ModelLookup::NotFound => panic!("model should exist after creation"),
    }
    assert_eq!(server.get_model("p1", &id).await.unwrap().name, "facade");
}

#[tokio::test]
async fn duplicate_model_name_is_rejected() {
    let server = MemoryServer::new().with_project(project("p1", "w"));
    server.create_model("p1", "facade").await.unwrap();

    assert!(server.create_model("p1", "facade").await.is_err());
    assert_eq!(server.models_created(), 1);
}

#[tokio::test]
async fn workspace_listing_preserves_order_and_scope() {
    let server = MemoryServer::new()
        .with_project(project("c", "w1"))
        .with_project(project("a", "w2"))
        .with_project(project("b", "w1"));

    let ids: Vec<String> = server
        .workspace_projects("w1")
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec!["c".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn version_requires_transferred_object() {
    let server = MemoryServer::new().with_project(project("p1", "w"));
    let model_id = server.create_model("p1", "main").await.unwrap();

    let err = server
        .create_version(version_input("p1", "nope", &model_id))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::GraphQl { .. }));

    let root = RootObject::from_value(json!({"speckle_type": "Base"}));
    let object_id = server.send(&root, "p1").await.unwrap();
    server
        .create_version(version_input("p1", &object_id, &model_id))
        .await
        .unwrap();
    assert_eq!(server.versions_in("p1").len(), 1);
}

// ===========================================================================
// ObjectTransport contract tests
// ===========================================================================

#[tokio::test]
async fn send_is_content_addressed() {
    let server = MemoryServer::new();
    let root = RootObject::from_value(json!({"speckle_type": "Base", "units": "m"}));

    let first = server.send(&root, "p1").await.unwrap();
    let second = server.send(&root, "p1").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first, root.id);
    assert_eq!(server.sends().len(), 2);
}

#[tokio::test]
async fn receive_returns_sent_graph() {
    let server = MemoryServer::new();
    let root = RootObject::from_value(json!({"speckle_type": "Base", "units": "m"}));
    server.send(&root, "p1").await.unwrap();

    let back = server.receive("p1", &root.id).await.unwrap();
    assert_eq!(back, root);
    assert!(server.receive("p2", &root.id).await.is_err());
}

#[tokio::test]
async fn receive_returns_stored_graph_without_prior_send() {
    let root = RootObject::from_value(json!({"speckle_type": "Base", "level": 4}));
    let server = MemoryServer::new().with_object("p1", &root);

    let back = server.receive("p1", &root.id).await.unwrap();
    assert_eq!(back, root);
    assert!(server.sends().is_empty());
}

// ===========================================================================
// RunContext contract tests
// ===========================================================================

#[tokio::test]
async fn run_context_records_reports_in_order() {
    let run_data = AutomationRunData {
        project_id: "origin".to_string(),
        speckle_server_url: String::new(),
        automation_id: "a".to_string(),
        automation_run_id: "r".to_string(),
        function_run_id: "f".to_string(),
        triggers: vec![Trigger::version_created("m1", "v1")],
    };
    let root = RootObject::from_value(json!({"speckle_type": "Base"}));
    let context = MemoryRunContext::new(run_data, root.clone());

    assert_eq!(context.receive_triggering_object().await.unwrap(), root);
    context
        .report_success("done", &["v9".to_string()])
        .await
        .unwrap();

    assert_eq!(
        context.reports(),
        vec![ReportedOutcome::Success {
            message: "done".to_string(),
            version_ids: vec!["v9".to_string()],
        }]
    );
}
