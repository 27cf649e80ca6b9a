//! Bridge Core Library
//!
//! Propagates the version that triggered an automation run onto every
//! recently updated sibling project of the same workspace.
//!
//! ## Components
//!
//! - [`lister::WorkspaceProjectLister`]: all projects of a workspace
//! - [`filter::ProjectFilter`]: recency / workspace / origin rules
//! - [`resolver::ModelResolver`]: find or create the destination model
//! - [`publisher::VersionPublisher`]: transfer the object, record the version
//! - [`orchestrator::RunOrchestrator`]: the run state machine

pub mod config;
pub mod error;
pub mod filter;
pub mod lister;
pub mod obs;
pub mod orchestrator;
pub mod publisher;
pub mod resolver;
pub mod result;
pub mod telemetry;

pub use config::{function_inputs_schema, FailurePolicy, FunctionInputs, RunOptions};
pub use error::{BridgeError, BridgeResult, ProjectFailure};
pub use filter::ProjectFilter;
pub use lister::WorkspaceProjectLister;
pub use orchestrator::{RunOrchestrator, RunReport, RunState};
pub use publisher::VersionPublisher;
pub use resolver::ModelResolver;
pub use result::{success_message, RunResult};
pub use telemetry::init_tracing;

/// Bridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
