//! Connection settings for the collaboration server.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

/// Default server when neither the run data nor the environment names one.
pub const DEFAULT_SERVER_URL: &str = "https://app.speckle.systems";

/// A credential that never shows up in `Debug` output or logs.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Expose the raw secret. Only call this where the value is sent.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "SecretString(\"\")")
        } else {
            write!(f, "SecretString(\"**********\")")
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL, e.g. "https://app.speckle.systems"
    pub server_url: String,
    /// Personal access or automation token
    pub token: SecretString,
    /// Per-request HTTP timeout
    pub timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            token: SecretString::default(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    /// Create a configuration for a specific server
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Create config from environment variables.
    ///
    /// - `SPECKLE_SERVER_URL`: optional base URL (default: app.speckle.systems)
    /// - `SPECKLE_TOKEN`: optional token
    /// - `SPECKLE_HTTP_TIMEOUT`: optional timeout in seconds (default: 60)
    pub fn from_env() -> Self {
        let server_url =
            std::env::var("SPECKLE_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        let timeout_secs = std::env::var("SPECKLE_HTTP_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        let mut config = Self::new(server_url).with_timeout(Duration::from_secs(timeout_secs));
        if let Ok(token) = std::env::var("SPECKLE_TOKEN") {
            config = config.with_token(SecretString::new(token));
        }
        config
    }

    /// Set the token
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = token;
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject configurations that cannot reach a server.
    pub fn validate(&self) -> Result<(), RemoteError> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(RemoteError::Config(format!(
                "server url must be http(s): {}",
                self.server_url
            )));
        }
        Ok(())
    }

    pub fn graphql_url(&self) -> String {
        format!("{}/graphql", self.server_url)
    }

    pub fn objects_url(&self, project_id: &str) -> String {
        format!("{}/objects/{}", self.server_url, project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_debug_is_redacted() {
        let secret = SecretString::new("super-secret-token");
        let printed = format!("{:?}", secret);
        assert!(!printed.contains("super-secret-token"));
        assert_eq!(secret.expose(), "super-secret-token");
    }

    #[test]
    fn whitespace_secret_counts_as_empty() {
        assert!(SecretString::new("   ").is_empty());
        assert!(!SecretString::new("t").is_empty());
    }

    #[test]
    fn new_trims_trailing_slash() {
        let config = ServerConfig::new("https://example.org/");
        assert_eq!(config.graphql_url(), "https://example.org/graphql");
        assert_eq!(config.objects_url("p1"), "https://example.org/objects/p1");
    }

    #[test]
    fn validate_rejects_non_http_url() {
        assert!(ServerConfig::new("ftp://example.org").validate().is_err());
        assert!(ServerConfig::new("https://example.org").validate().is_ok());
    }
}
