//! Error types for bridge-remote

use thiserror::Error;

/// Errors raised by the remote collaborators (GraphQL API, object transport,
/// automation run context).
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Token missing, rejected, or not bound to a user
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Transport level HTTP failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// The GraphQL endpoint answered with an `errors` array
    #[error("GraphQL query failed: {}", .messages.join("; "))]
    GraphQl { messages: Vec<String> },

    /// The GraphQL endpoint answered without a `data` payload
    #[error("GraphQL query returned no data: {0}")]
    EmptyResponse(String),

    /// A referenced entity does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Object upload or download failed
    #[error("Object transfer failed: {0}")]
    Transfer(String),

    /// Response body could not be decoded
    #[error("Deserialization failed: {0}")]
    Deserialization(String),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::Deserialization(err.to_string())
    }
}
