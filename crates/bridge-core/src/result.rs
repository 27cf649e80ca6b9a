//! Per-run result accumulator.

use crate::error::ProjectFailure;

/// Everything a run produced. Built up by the orchestrator and reported once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    /// Ids of the versions created, in publish order.
    pub published_version_ids: Vec<String>,
    /// Names of the projects that received a version, in publish order.
    pub published_projects: Vec<String>,
    /// Projects skipped after an error under the best-effort policy.
    pub failures: Vec<ProjectFailure>,
    pub summary_message: Option<String>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_version(&mut self, version_id: impl Into<String>) {
        self.published_version_ids.push(version_id.into());
    }

    pub fn record_project(&mut self, project_name: impl Into<String>) {
        self.published_projects.push(project_name.into());
    }

    pub fn record_failure(&mut self, failure: ProjectFailure) {
        self.failures.push(failure);
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Human-readable success summary reported to the run's owner.
pub fn success_message(workspace_id: &str, project_names: &[String]) -> String {
    let quoted: Vec<String> = project_names.iter().map(|n| format!("'{}'", n)).collect();
    format!(
        "Model successfully shared to {} projects in the workspace {}. All Projects: [{}]",
        project_names.len(),
        workspace_id,
        quoted.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_message_names_every_project() {
        let msg = success_message("ws-1", &["Tower".to_string(), "Annex".to_string()]);
        assert_eq!(
            msg,
            "Model successfully shared to 2 projects in the workspace ws-1. All Projects: ['Tower', 'Annex']"
        );
    }

    #[test]
    fn success_message_for_no_projects() {
        let msg = success_message("ws-1", &[]);
        assert!(msg.starts_with("Model successfully shared to 0 projects"));
        assert!(msg.ends_with("All Projects: []"));
    }

    #[test]
    fn accumulator_keeps_order() {
        let mut result = RunResult::new();
        result.record_version("v1");
        result.record_version("v2");
        assert_eq!(result.published_version_ids, vec!["v1", "v2"]);
        assert!(!result.has_failures());
    }
}
