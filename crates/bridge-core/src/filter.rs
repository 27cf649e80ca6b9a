//! Target selection among a workspace's projects.

use std::collections::HashSet;

use bridge_remote::Project;
use chrono::{DateTime, Duration, Utc};

use crate::config::DEFAULT_RECENCY_WINDOW_SECS;

/// Picks the sibling projects that should receive the propagated version.
///
/// A project qualifies when it belongs to the target workspace, was updated
/// no earlier than `now - window` (inclusive), and is not the origin project.
/// A project listed more than once is kept at its first position only, so a
/// run never publishes twice into the same project.
#[derive(Debug, Clone, Copy)]
pub struct ProjectFilter {
    window: Duration,
}

impl Default for ProjectFilter {
    fn default() -> Self {
        Self {
            window: Duration::seconds(DEFAULT_RECENCY_WINDOW_SECS),
        }
    }
}

impl ProjectFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Filter `projects`, preserving their order and dropping repeated ids.
    pub fn filter(
        &self,
        projects: &[Project],
        workspace_id: &str,
        origin_project_id: &str,
        now: DateTime<Utc>,
    ) -> Vec<Project> {
        let cutoff = now - self.window;
        let mut seen = HashSet::new();
        projects
            .iter()
            .filter(|p| p.workspace_id.as_deref() == Some(workspace_id))
            .filter(|p| p.updated_at >= cutoff)
            .filter(|p| p.id != origin_project_id)
            .filter(|p| seen.insert(p.id.as_str()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: &str, workspace: Option<&str>, updated_at: DateTime<Utc>) -> Project {
        Project {
            id: id.to_string(),
            name: id.to_uppercase(),
            workspace_id: workspace.map(str::to_string),
            updated_at,
            visibility: None,
            role: None,
            source_apps: vec![],
        }
    }

    fn ids(projects: &[Project]) -> Vec<&str> {
        projects.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn keeps_fresh_siblings_in_input_order() {
        let now = Utc::now();
        let projects = vec![
            project("c", Some("w"), now - Duration::minutes(5)),
            project("a", Some("w"), now - Duration::minutes(50)),
            project("b", Some("w"), now),
        ];
        let out = ProjectFilter::new().filter(&projects, "w", "origin", now);
        assert_eq!(ids(&out), vec!["c", "a", "b"]);
    }

    #[test]
    fn excludes_other_workspaces_and_unscoped_projects() {
        let now = Utc::now();
        let projects = vec![
            project("x", Some("other"), now),
            project("y", None, now),
            project("z", Some("w"), now),
        ];
        let out = ProjectFilter::new().filter(&projects, "w", "origin", now);
        assert_eq!(ids(&out), vec!["z"]);
    }

    #[test]
    fn origin_is_never_selected() {
        let now = Utc::now();
        let projects = vec![project("origin", Some("w"), now)];
        assert!(ProjectFilter::new()
            .filter(&projects, "w", "origin", now)
            .is_empty());
    }

    #[test]
    fn boundary_is_inclusive() {
        let now = Utc::now();
        let projects = vec![
            project("edge", Some("w"), now - Duration::hours(1)),
            project("late", Some("w"), now - Duration::hours(1) - Duration::seconds(1)),
        ];
        let out = ProjectFilter::new().filter(&projects, "w", "origin", now);
        assert_eq!(ids(&out), vec!["edge"]);
    }

    #[test]
    fn repeated_project_is_kept_once_at_first_position() {
        let now = Utc::now();
        let projects = vec![
            project("a", Some("w"), now),
            project("b", Some("w"), now),
            project("a", Some("w"), now - Duration::minutes(1)),
        ];
        let out = ProjectFilter::new().filter(&projects, "w", "origin", now);
        assert_eq!(ids(&out), vec!["a", "b"]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(ProjectFilter::new()
            .filter(&[], "w", "origin", Utc::now())
            .is_empty());
    }

    #[test]
    fn custom_window_is_honoured() {
        let now = Utc::now();
        let projects = vec![project("p", Some("w"), now - Duration::hours(3))];
        let filter = ProjectFilter::with_window(Duration::hours(4));
        assert_eq!(filter.window(), Duration::hours(4));
        assert_eq!(ids(&filter.filter(&projects, "w", "origin", now)), vec!["p"]);
    }
}
