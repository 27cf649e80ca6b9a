//! Structured observability hooks for the propagation run.
//!
//! This module provides:
//! - A run-scoped tracing span via `run_span`
//! - Emission functions for the run's lifecycle events
//!
//! Events are emitted at `info!` level (filter with `RUST_LOG`).
//! For JSON output pass `--json` to the binary.

use tracing::{info, warn};

use crate::orchestrator::RunState;

/// Span covering one run, tagged with the automation run and origin project.
///
/// # Example
///
/// ```ignore
/// orchestrator.execute(..).instrument(run_span("run-12345", "project-1")).await
/// // every event below carries automation_run_id and project_id
/// ```
pub fn run_span(automation_run_id: &str, project_id: &str) -> tracing::Span {
    tracing::info_span!(
        "bridge.run",
        automation_run_id = %automation_run_id,
        project_id = %project_id
    )
}

/// Emit event: run started.
pub fn emit_run_started(project_id: &str, trigger_count: usize) {
    info!(event = "run.started", project_id = %project_id, triggers = trigger_count);
}

/// Emit event: the orchestrator entered a new state.
pub fn emit_state(state: &RunState) {
    info!(event = "run.state", state = %state);
}

/// Emit event: candidate projects filtered down to the targets.
pub fn emit_projects_filtered(workspace_id: &str, listed: usize, targets: usize) {
    info!(
        event = "projects.filtered",
        workspace_id = %workspace_id,
        listed = listed,
        targets = targets,
    );
}

/// Emit event: a destination model was resolved.
pub fn emit_model_resolved(project_id: &str, model_id: &str, created: bool) {
    let event = if created {
        "model.created"
    } else {
        "model.resolved"
    };
    info!(
        event = event,
        project_id = %project_id,
        model_id = %model_id,
    );
}

/// Emit event: a version was published into a destination project.
pub fn emit_version_published(project_id: &str, model_id: &str, object_id: &str, version_id: &str) {
    info!(
        event = "version.published",
        project_id = %project_id,
        model_id = %model_id,
        object_id = %object_id,
        version_id = %version_id,
    );
}

/// Emit event: publishing to one project failed (warning level).
pub fn emit_project_failed(project_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "project.failed", project_id = %project_id, error = %error);
}

/// Emit event: run finished.
pub fn emit_run_finished(published: usize, success: bool) {
    info!(event = "run.finished", published = published, success = success);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_create() {
        let _entered = run_span("run-1", "project-1").entered();
        emit_state(&RunState::Initializing);
    }
}
