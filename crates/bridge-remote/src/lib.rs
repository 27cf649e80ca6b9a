//! Bridge-Remote: collaborators of the automation bridge
//!
//! This crate owns everything that talks to the outside world. The
//! propagation workflow in `bridge-core` only sees the traits defined here.
//!
//! ## Key Components
//!
//! - `ServerApi` / `HttpServerApi`: GraphQL operations on projects, models and versions
//! - `ObjectTransport` / `ServerTransport`: object graph upload and download
//! - `RunContext` / `AutomateRunContext`: trigger metadata and status reporting
//! - `fakes`: in-memory implementations for tests

pub mod automate;
pub mod config;
mod error;
pub mod fakes;
pub mod graphql;
pub mod remote_traits;
pub mod server_api;
pub mod transport;
pub mod types;

pub use automate::{AutomateRunContext, FunctionRunStatus};
pub use config::{SecretString, ServerConfig, DEFAULT_SERVER_URL};
pub use error::RemoteError;
pub use graphql::GraphQlClient;
pub use remote_traits::{ObjectTransport, RemoteResult, RunContext, ServerApi};
pub use server_api::HttpServerApi;
pub use transport::ServerTransport;
pub use types::{
    object_hash, AutomationRunData, CreateVersionInput, Model, ModelLookup, Project, RootObject,
    Trigger, TriggerPayload, SOURCE_APPLICATION,
};
