use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{Message, Role};
use crate::settings::AssistantSettings;

/// Failure talking to a remote collaborator.
///
/// Every variant is recovered the same way by the services; the split only
/// matters for logs.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One `{role, content}` entry of the outbound history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        let role = match message.role() {
            Role::User => TurnRole::User,
            Role::Assistant | Role::Image => TurnRole::Assistant,
        };
        Self {
            role,
            content: message.content().to_string(),
        }
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the full history and return the reply text.
    async fn complete(&self, history: &[ChatTurn]) -> Result<String, CollaboratorError>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completion endpoint (Fireworks by default).
pub struct FireworksCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl FireworksCompletionClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
        }
    }

    pub fn from_settings(settings: &AssistantSettings) -> Self {
        Self::new(
            settings.completion_url.clone(),
            settings.completion_model.clone(),
            settings.api_key.clone(),
        )
    }
}

#[async_trait]
impl CompletionClient for FireworksCompletionClient {
    async fn complete(&self, history: &[ChatTurn]) -> Result<String, CollaboratorError> {
        let mut request = self.http.post(&self.endpoint).json(&CompletionRequest {
            model: &self.model,
            messages: history,
        });
        // Without a key the endpoint answers 401, which is handled like any
        // other failed request.
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(turns = history.len(), model = %self.model, "Sending completion request");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| CollaboratorError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                CollaboratorError::MalformedResponse("missing choices[0].message.content".into())
            })
    }
}
