//! Function inputs and run options.
//!
//! The host runner hands the function its inputs as a JSON document. Only
//! `speckle_token` is required by the workflow; the other inputs are optional
//! knobs with defaults matching the historical behaviour.

use std::path::Path;
use std::str::FromStr;

use bridge_remote::SecretString;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

/// How long ago a sibling project may have been updated to still receive
/// the propagated version.
pub const DEFAULT_RECENCY_WINDOW_SECS: i64 = 60 * 60;

/// What to do when publishing to one target project fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the run at the first failing project.
    #[default]
    FailFast,
    /// Keep publishing to the remaining projects and fail the run at the end
    /// with every collected failure.
    BestEffort,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_fast" => Ok(FailurePolicy::FailFast),
            "best_effort" => Ok(FailurePolicy::BestEffort),
            other => Err(format!(
                "unknown failure policy '{}', expected fail_fast or best_effort",
                other
            )),
        }
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::FailFast => write!(f, "fail_fast"),
            FailurePolicy::BestEffort => write!(f, "best_effort"),
        }
    }
}

/// Author-defined function inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInputs {
    /// Personal access token used for every workspace operation.
    #[serde(default, alias = "speckle_token")]
    pub speckle_token: SecretString,

    /// Message recorded on each propagated version.
    #[serde(default, alias = "version_message")]
    pub version_message: String,

    #[serde(default, alias = "failure_policy")]
    pub failure_policy: FailurePolicy,
}

impl FunctionInputs {
    /// Parse the inputs document handed over by the host runner.
    pub fn from_json(json: &str) -> BridgeResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| BridgeError::Context(format!("invalid function inputs: {}", e)))
    }

    pub fn from_file(path: &Path) -> BridgeResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Context(format!(
                "cannot read function inputs {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }
}

/// JSON schema of [`FunctionInputs`], published to the host so it can render
/// the input form.
pub fn function_inputs_schema() -> serde_json::Value {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "FunctionInputs",
        "type": "object",
        "properties": {
            "speckleToken": {
                "title": "Speckle token",
                "type": "string",
                "format": "password",
                "writeOnly": true,
                "default": ""
            },
            "versionMessage": {
                "title": "Version message",
                "type": "string",
                "default": ""
            },
            "failurePolicy": {
                "title": "Failure policy",
                "type": "string",
                "enum": ["fail_fast", "best_effort"],
                "default": "fail_fast"
            }
        }
    })
}

/// Options driving one orchestrator run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub token: SecretString,
    pub version_message: String,
    pub failure_policy: FailurePolicy,
    pub recency_window: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            token: SecretString::default(),
            version_message: String::new(),
            failure_policy: FailurePolicy::default(),
            recency_window: Duration::seconds(DEFAULT_RECENCY_WINDOW_SECS),
        }
    }
}

impl From<FunctionInputs> for RunOptions {
    fn from(inputs: FunctionInputs) -> Self {
        Self {
            token: inputs.speckle_token,
            version_message: inputs.version_message,
            failure_policy: inputs.failure_policy,
            ..Self::default()
        }
    }
}

impl RunOptions {
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_recency_window(mut self, window: Duration) -> Self {
        self.recency_window = window;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inputs_default_to_empty_token_and_fail_fast() {
        let inputs = FunctionInputs::from_json("{}").unwrap();
        assert!(inputs.speckle_token.is_empty());
        assert_eq!(inputs.failure_policy, FailurePolicy::FailFast);
        assert_eq!(inputs.version_message, "");
    }

    #[test]
    fn inputs_accept_snake_and_camel_case() {
        let snake = FunctionInputs::from_json(r#"{"speckle_token": "abc"}"#).unwrap();
        let camel = FunctionInputs::from_json(r#"{"speckleToken": "abc"}"#).unwrap();
        assert_eq!(snake.speckle_token.expose(), "abc");
        assert_eq!(snake, camel);
    }

    #[test]
    fn inputs_parse_failure_policy() {
        let inputs = FunctionInputs::from_json(r#"{"failurePolicy": "best_effort"}"#).unwrap();
        assert_eq!(inputs.failure_policy, FailurePolicy::BestEffort);
    }

    #[test]
    fn malformed_inputs_are_context_errors() {
        let err = FunctionInputs::from_json("not json").unwrap_err();
        assert!(matches!(err, BridgeError::Context(_)));
    }

    #[test]
    fn failure_policy_from_str() {
        assert_eq!(
            "best-effort".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::BestEffort
        );
        assert_eq!(
            "FAIL_FAST".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::FailFast
        );
        assert!("sometimes".parse::<FailurePolicy>().is_err());
    }

    #[test]
    fn run_options_default_window_is_one_hour() {
        let options = RunOptions::from(FunctionInputs::default());
        assert_eq!(options.recency_window, Duration::hours(1));
    }

    #[test]
    fn schema_lists_token_property() {
        let schema = function_inputs_schema();
        assert_eq!(schema["properties"]["speckleToken"]["default"], "");
    }
}
