//! Minimal GraphQL-over-HTTP client.
//!
//! Posts `{query, variables}` documents with a bearer token and unwraps the
//! `{data, errors}` envelope.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::RemoteError;
use crate::remote_traits::RemoteResult;

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

/// GraphQL client bound to one server and one token.
#[derive(Clone)]
pub struct GraphQlClient {
    config: ServerConfig,
    http_client: reqwest::Client,
}

impl GraphQlClient {
    pub fn new(config: ServerConfig) -> RemoteResult<Self> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("automation-bridge/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Attach the bearer token, when one is configured.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.config.token.is_empty() {
            request
        } else {
            request.bearer_auth(self.config.token.expose())
        }
    }

    /// Execute a query and decode its `data` payload into `T`.
    ///
    /// `operation` names the query in error messages and logs.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> RemoteResult<T> {
        debug!(operation = %operation, "graphql request");
        let request = self
            .http_client
            .post(self.config.graphql_url())
            .json(&GraphQlRequest { query, variables });
        let response = self.authorize(request).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(RemoteError::Authentication(format!(
                "{} rejected with HTTP {}",
                operation, status
            )));
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(RemoteError::Http(format!(
                "{} returned HTTP {}: {}",
                operation, status, body
            )));
        }

        decode_envelope(operation, &body)
    }
}

/// Unwrap a GraphQL response body.
///
/// Errors take precedence over partial data.
pub(crate) fn decode_envelope<T: DeserializeOwned>(operation: &str, body: &str) -> RemoteResult<T> {
    let envelope: GraphQlResponse<T> = serde_json::from_str(body)?;
    if !envelope.errors.is_empty() {
        return Err(RemoteError::GraphQl {
            messages: envelope.errors.into_iter().map(|e| e.message).collect(),
        });
    }
    envelope
        .data
        .ok_or_else(|| RemoteError::EmptyResponse(operation.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Ping {
        ping: String,
    }

    #[test]
    fn decodes_data() {
        let ping: Ping = decode_envelope("ping", r#"{"data":{"ping":"pong"}}"#).unwrap();
        assert_eq!(ping.ping, "pong");
    }

    #[test]
    fn errors_win_over_data() {
        let err = decode_envelope::<Ping>(
            "ping",
            r#"{"data":{"ping":"pong"},"errors":[{"message":"forbidden"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RemoteError::GraphQl { .. }));
        assert!(err.to_string().contains("forbidden"));
    }

    #[test]
    fn missing_data_is_empty_response() {
        let err = decode_envelope::<Ping>("ping", r#"{"data":null}"#).unwrap_err();
        assert!(matches!(err, RemoteError::EmptyResponse(op) if op == "ping"));
    }

    #[test]
    fn client_rejects_invalid_url() {
        assert!(GraphQlClient::new(ServerConfig::new("not-a-url")).is_err());
    }
}
