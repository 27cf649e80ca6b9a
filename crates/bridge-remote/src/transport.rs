//! Server object transport
//!
//! Moves object graphs through the server's REST object endpoints:
//! `POST /objects/{project}` takes multipart JSON batches and
//! `GET /objects/{project}/{object}` returns the root plus its children.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::error::RemoteError;
use crate::remote_traits::{ObjectTransport, RemoteResult};
use crate::types::RootObject;

/// Object transport backed by the server's HTTP object API.
pub struct ServerTransport {
    config: ServerConfig,
    http_client: reqwest::Client,
}

impl ServerTransport {
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

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.config.token.is_empty() {
            request
        } else {
            request.bearer_auth(self.config.token.expose())
        }
    }
}

/// Serialize the whole closure as one upload batch.
fn batch_body(root: &RootObject) -> RemoteResult<String> {
    if root.objects.is_empty() {
        return Err(RemoteError::Transfer(format!(
            "object {} has no content to send",
            root.id
        )));
    }
    Ok(serde_json::to_string(&root.objects)?)
}

#[async_trait]
impl ObjectTransport for ServerTransport {
    async fn send(&self, root: &RootObject, project_id: &str) -> RemoteResult<String> {
        let body = batch_body(root)?;
        let part = Part::text(body)
            .file_name("batch-1")
            .mime_str("application/json")
            .map_err(|e| RemoteError::Transfer(e.to_string()))?;
        let form = Form::new().part("batch-1", part);

        debug!(
            project_id = %project_id,
            object_id = %root.id,
            objects = root.objects.len(),
            "uploading object batch"
        );
        let request = self
            .http_client
            .post(self.config.objects_url(project_id))
            .multipart(form);
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| RemoteError::Transfer(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RemoteError::Transfer(format!(
                "upload to project {} failed with HTTP {}: {}",
                project_id, status, text
            )));
        }

        info!(project_id = %project_id, object_id = %root.id, "object graph sent");
        Ok(root.id.clone())
    }

    async fn receive(&self, project_id: &str, object_id: &str) -> RemoteResult<RootObject> {
        let url = format!("{}/{}", self.config.objects_url(project_id), object_id);
        let request = self.http_client.get(url).header(ACCEPT, "application/json");
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| RemoteError::Transfer(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound {
                kind: "Object",
                id: object_id.to_string(),
            });
        }
        if !status.is_success() {
            return Err(RemoteError::Transfer(format!(
                "download of {} failed with HTTP {}",
                object_id, status
            )));
        }

        let objects: Vec<serde_json::Value> = response.json().await?;
        RootObject::from_closure(objects).ok_or_else(|| {
            RemoteError::Transfer(format!("object {} came back without a root", object_id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_body_is_json_array() {
        let root = RootObject::from_value(json!({"speckle_type": "Base"}));
        let body = batch_body(&root).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["id"], json!(root.id));
    }

    #[test]
    fn empty_closure_cannot_be_sent() {
        let root = RootObject {
            id: "abc".to_string(),
            objects: vec![],
        };
        assert!(matches!(batch_body(&root), Err(RemoteError::Transfer(_))));
    }
}
