//! Assistant v1 REST client. Every call carries `?version=<date>` and HTTP basic auth
//! (`apikey:<key>` in API-key mode, otherwise the configured username and password).

use super::{AssistantApi, ClientFactory, MessageRequest, Workspace};
use crate::credentials::{Auth, Credentials};
use crate::training::TrainingDefinition;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

/// Username sent with an API key over basic auth.
const APIKEY_USERNAME: &str = "apikey";

/// Client for the assistant HTTP API.
#[derive(Clone)]
pub struct AssistantClient {
    base_url: String,
    auth: Auth,
    version: String,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("assistant request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("assistant api error: {status} {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Deserialize)]
struct WorkspaceCollection {
    #[serde(default)]
    workspaces: Vec<Workspace>,
}

impl AssistantClient {
    pub fn new(credentials: Credentials, version: impl Into<String>) -> Self {
        Self {
            base_url: credentials.endpoint_url.trim_end_matches('/').to_string(),
            auth: credentials.auth,
            version: version.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.query(&[("version", self.version.as_str())]);
        match &self.auth {
            Auth::ApiKey(key) => req.basic_auth(APIKEY_USERNAME, Some(key)),
            Auth::Basic { username, password } => req.basic_auth(username, Some(password)),
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, AssistantError> {
        let res = self.authorize(req).send().await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(AssistantError::Api { status, body });
        }
        Ok(res.json().await?)
    }
}

#[async_trait]
impl AssistantApi for AssistantClient {
    /// GET /v1/workspaces
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, AssistantError> {
        let req = self.client.get(self.url("/workspaces"));
        let data: WorkspaceCollection = self.send(req).await?;
        Ok(data.workspaces)
    }

    /// POST /v1/workspaces
    async fn create_workspace(
        &self,
        definition: &TrainingDefinition,
    ) -> Result<Workspace, AssistantError> {
        let req = self.client.post(self.url("/workspaces")).json(definition);
        self.send(req).await
    }

    /// POST /v1/workspaces/{id}/message
    async fn message(
        &self,
        workspace_id: &str,
        request: &MessageRequest,
    ) -> Result<serde_json::Value, AssistantError> {
        let path = format!("/workspaces/{}/message", workspace_id);
        let req = self.client.post(self.url(&path)).json(request);
        self.send(req).await
    }
}

/// Factory for [`AssistantClient`] pinned to one API version.
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    version: String,
}

impl HttpClientFactory {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl ClientFactory for HttpClientFactory {
    fn connect(&self, credentials: Credentials) -> Arc<dyn AssistantApi> {
        log::debug!("creating assistant client for {}", credentials.endpoint_url);
        Arc::new(AssistantClient::new(credentials, self.version.clone()))
    }
}
