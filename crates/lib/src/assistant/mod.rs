//! Remote assistant service: API trait, wire types, and the HTTP client.
//!
//! Supports listing workspaces, creating a workspace from a training definition, and sending a message.

mod client;

pub use client::{AssistantClient, AssistantError, HttpClientFactory};

use crate::credentials::Credentials;
use crate::training::TrainingDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Operations the relay needs from the remote service. Response payloads of `message` are opaque.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// List workspaces in the order the service returns them.
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, AssistantError>;

    /// Create a workspace from a training definition.
    async fn create_workspace(
        &self,
        definition: &TrainingDefinition,
    ) -> Result<Workspace, AssistantError>;

    /// Send one conversation turn to a workspace; returns the response JSON unmodified.
    async fn message(
        &self,
        workspace_id: &str,
        request: &MessageRequest,
    ) -> Result<serde_json::Value, AssistantError>;
}

/// Builds the long-lived API handle from resolved credentials.
pub trait ClientFactory: Send + Sync {
    fn connect(&self, credentials: Credentials) -> Arc<dyn AssistantApi>;
}

/// Workspace summary (list and create responses). Other fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub workspace_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// User input of one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageInput {
    #[serde(default)]
    pub text: String,
}

/// Body of the "message" call: input text plus caller-owned context, forwarded verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageRequest {
    pub input: MessageInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}
