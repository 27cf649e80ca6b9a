//! Run orchestrator: the top-level propagation sequence.
//!
//! `Initializing → ResolvingContext → Listing → Filtering → Publishing(i) →
//! Reporting → Done`, with `Failed` reachable from every non-terminal state.
//! Every remote call is awaited before the next one starts; target projects
//! are processed strictly one after another.

use std::sync::Arc;

use bridge_remote::{
    ObjectTransport, Project, RemoteError, RootObject, RunContext, ServerApi, Trigger,
};
use chrono::Utc;
use tracing::{warn, Instrument};

use crate::config::{FailurePolicy, RunOptions};
use crate::error::{BridgeError, BridgeResult, ProjectFailure};
use crate::filter::ProjectFilter;
use crate::lister::WorkspaceProjectLister;
use crate::obs;
use crate::publisher::VersionPublisher;
use crate::resolver::ModelResolver;
use crate::result::{success_message, RunResult};

/// Where a run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Initializing,
    ResolvingContext,
    Listing,
    Filtering,
    Publishing { index: usize, total: usize },
    Reporting,
    Done,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }

    /// Whether `next` may follow `self`.
    pub fn can_transition_to(&self, next: &RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Initializing, ResolvingContext)
            | (ResolvingContext, Listing)
            | (Listing, Filtering)
            | (Filtering, Reporting)
            | (Reporting, Done) => true,
            (Filtering, Publishing { index, total }) => *index == 0 && *total > 0,
            (
                Publishing { index, total },
                Publishing {
                    index: next_index,
                    total: next_total,
                },
            ) => next_total == total && *next_index == index + 1 && next_index < next_total,
            (Publishing { index, total }, Reporting) => index + 1 == *total,
            _ => false,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Initializing => write!(f, "initializing"),
            RunState::ResolvingContext => write!(f, "resolving_context"),
            RunState::Listing => write!(f, "listing"),
            RunState::Filtering => write!(f, "filtering"),
            RunState::Publishing { index, total } => {
                write!(f, "publishing({}/{})", index + 1, total)
            }
            RunState::Reporting => write!(f, "reporting"),
            RunState::Done => write!(f, "done"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}

/// Records the state path of one run.
#[derive(Debug)]
struct RunProgress {
    history: Vec<RunState>,
}

impl RunProgress {
    fn new() -> Self {
        obs::emit_state(&RunState::Initializing);
        Self {
            history: vec![RunState::Initializing],
        }
    }

    fn current(&self) -> &RunState {
        // history is never empty
        &self.history[self.history.len() - 1]
    }

    fn advance(&mut self, next: RunState) {
        if !self.current().can_transition_to(&next) {
            warn!(from = %self.current(), to = %next, "unexpected run state transition");
        }
        obs::emit_state(&next);
        self.history.push(next);
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub workspace_id: String,
    pub result: RunResult,
    /// States visited, in order.
    pub states: Vec<RunState>,
}

/// What the run resolved before publishing.
struct ResolvedContext {
    root: RootObject,
    workspace_id: String,
    model_name: String,
}

/// Drives one propagation run against injected collaborators.
pub struct RunOrchestrator {
    api: Arc<dyn ServerApi>,
    transport: Arc<dyn ObjectTransport>,
    lister: WorkspaceProjectLister,
    filter: ProjectFilter,
    resolver: ModelResolver,
    options: RunOptions,
}

impl RunOrchestrator {
    pub fn new(
        api: Arc<dyn ServerApi>,
        transport: Arc<dyn ObjectTransport>,
        options: RunOptions,
    ) -> Self {
        Self {
            lister: WorkspaceProjectLister::new(Arc::clone(&api)),
            filter: ProjectFilter::with_window(options.recency_window),
            resolver: ModelResolver::new(Arc::clone(&api)),
            api,
            transport,
            options,
        }
    }

    /// Run the whole sequence and report the outcome through `context`.
    ///
    /// On failure the error message is reported verbatim and the error is
    /// returned. Versions published before the failure are kept.
    pub async fn run(&self, context: &dyn RunContext) -> BridgeResult<RunReport> {
        let run_data = context.run_data();
        let span = obs::run_span(&run_data.automation_run_id, &run_data.project_id);
        self.run_reported(context).instrument(span).await
    }

    async fn run_reported(&self, context: &dyn RunContext) -> BridgeResult<RunReport> {
        let run_data = context.run_data();
        obs::emit_run_started(&run_data.project_id, run_data.triggers.len());

        let mut progress = RunProgress::new();
        let mut result = RunResult::new();

        match self.execute(context, &mut progress, &mut result).await {
            Ok(workspace_id) => {
                progress.advance(RunState::Reporting);
                let message = success_message(&workspace_id, &result.published_projects);
                if let Err(e) = context
                    .report_success(&message, &result.published_version_ids)
                    .await
                {
                    progress.advance(RunState::Failed);
                    obs::emit_run_finished(result.published_version_ids.len(), false);
                    return Err(BridgeError::Context(format!(
                        "could not report run success: {}",
                        e
                    )));
                }
                result.summary_message = Some(message);
                progress.advance(RunState::Done);
                obs::emit_run_finished(result.published_version_ids.len(), true);
                Ok(RunReport {
                    workspace_id,
                    result,
                    states: progress.history,
                })
            }
            Err(err) => {
                progress.advance(RunState::Failed);
                if let Err(report_err) = context.report_failure(&err.to_string()).await {
                    warn!(error = %report_err, "could not report run failure");
                }
                obs::emit_run_finished(result.published_version_ids.len(), false);
                Err(err)
            }
        }
    }

    /// Everything up to and including publishing. Returns the workspace id.
    async fn execute(
        &self,
        context: &dyn RunContext,
        progress: &mut RunProgress,
        result: &mut RunResult,
    ) -> BridgeResult<String> {
        let resolved = self.initialize(context, progress).await?;
        let run_data = context.run_data();

        progress.advance(RunState::Listing);
        let projects = self.lister.list(&resolved.workspace_id).await?;

        progress.advance(RunState::Filtering);
        let targets = self.filter.filter(
            &projects,
            &resolved.workspace_id,
            &run_data.project_id,
            Utc::now(),
        );
        obs::emit_projects_filtered(&resolved.workspace_id, projects.len(), targets.len());

        let publisher = VersionPublisher::new(
            Arc::clone(&self.api),
            Arc::clone(&self.transport),
            run_data.project_id.clone(),
        );
        let total = targets.len();

        for (index, project) in targets.iter().enumerate() {
            progress.advance(RunState::Publishing { index, total });
            let published = self
                .publish_to(
                    project,
                    &resolved.model_name,
                    &run_data.triggers,
                    &resolved.root,
                    &publisher,
                    result,
                )
                .await;

            match published {
                Ok(()) => result.record_project(project.name.clone()),
                Err(err) => {
                    obs::emit_project_failed(&project.id, &err);
                    let run_level = matches!(err, BridgeError::Authentication(_));
                    if self.options.failure_policy == FailurePolicy::FailFast || run_level {
                        return Err(err);
                    }
                    result.record_failure(ProjectFailure {
                        project_id: project.id.clone(),
                        project_name: project.name.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        if result.has_failures() {
            return Err(BridgeError::PartialFailure {
                total,
                failures: result.failures.clone(),
            });
        }
        Ok(resolved.workspace_id)
    }

    /// `Initializing` and `ResolvingContext`.
    async fn initialize(
        &self,
        context: &dyn RunContext,
        progress: &mut RunProgress,
    ) -> BridgeResult<ResolvedContext> {
        if self.options.token.is_empty() {
            return Err(BridgeError::Authentication(
                "no token provided in the function inputs".to_string(),
            ));
        }
        self.api
            .authenticate(self.options.token.expose())
            .await
            .map_err(|e| match e {
                RemoteError::Authentication(msg) => BridgeError::Authentication(msg),
                other => BridgeError::Authentication(other.to_string()),
            })?;

        let root = context.receive_triggering_object().await?;

        progress.advance(RunState::ResolvingContext);
        let run_data = context.run_data();
        let origin = self.api.get_project(&run_data.project_id).await?;
        let workspace_id = origin
            .workspace_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                BridgeError::Context(format!(
                    "project {} is not part of a workspace",
                    run_data.project_id
                ))
            })?;

        let trigger = run_data
            .triggers
            .first()
            .ok_or_else(|| BridgeError::Context("automation run has no triggers".to_string()))?;
        let model_name = self
            .api
            .get_model(&run_data.project_id, &trigger.payload.model_id)
            .await?
            .name;

        Ok(ResolvedContext {
            root,
            workspace_id,
            model_name,
        })
    }

    /// Resolve the destination model, then publish into it.
    async fn publish_to(
        &self,
        project: &Project,
        model_name: &str,
        triggers: &[Trigger],
        root: &RootObject,
        publisher: &VersionPublisher,
        result: &mut RunResult,
    ) -> BridgeResult<()> {
        let model_id = self
            .resolver
            .resolve(&project.id, model_name, triggers)
            .await?;
        publisher
            .publish(
                &project.id,
                &model_id,
                root,
                &self.options.version_message,
                result,
            )
            .await?;
        Ok(())
    }
}
