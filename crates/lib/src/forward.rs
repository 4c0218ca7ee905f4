//! Forward one inbound turn to the assistant and hand back its response untouched.

use crate::assistant::{AssistantApi, AssistantError, MessageInput, MessageRequest};
use serde::{Deserialize, Serialize};

/// Inbound body of `POST /api/message`: `{ "input": { "text": ... }, "context": { ... } }`.
/// A missing `input` or `text` is forwarded as an empty string (how a client opens a conversation).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub input: Option<MessageInput>,
    /// Conversation state owned by the caller.
    #[serde(default)]
    pub context: Option<serde_json::Value>,
}

impl InboundMessage {
    pub fn text(&self) -> &str {
        self.input.as_ref().map(|i| i.text.as_str()).unwrap_or("")
    }

    fn into_request(self) -> MessageRequest {
        MessageRequest {
            input: MessageInput {
                text: self.text().to_string(),
            },
            context: self.context,
        }
    }
}

/// Send the turn to `workspace_id`. An absent message is a no-op: logs a warning and returns `None`.
pub async fn forward(
    api: &dyn AssistantApi,
    workspace_id: &str,
    inbound: Option<InboundMessage>,
) -> Result<Option<serde_json::Value>, AssistantError> {
    let Some(inbound) = inbound else {
        log::warn!("call to /api/message with an empty body");
        return Ok(None);
    };
    let request = inbound.into_request();
    let response = api.message(workspace_id, &request).await?;
    Ok(Some(response))
}
