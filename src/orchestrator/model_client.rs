//! Language model client
//!
//! `ModelClient` is the only way the pipeline talks to a model. The default
//! implementation speaks the OpenAI-compatible chat completions protocol.

use crate::models::{ConversationTurn, ModelConfig, Role};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl From<Role> for ChatRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => ChatRole::User,
            Role::Assistant => ChatRole::Assistant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ConversationTurn> for ChatMessage {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            role: turn.role.into(),
            content: turn.content.to_text(),
        }
    }
}

/// Sampling settings sent with a completion request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingParams {
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
}

impl SamplingParams {
    /// Drafting and chat replies
    pub const GENERATIVE: Self = Self {
        temperature: 0.0,
        top_p: Some(0.8),
        frequency_penalty: Some(0.2),
        presence_penalty: Some(0.1),
    };

    /// Critique and improvement
    pub const DETERMINISTIC: Self = Self {
        temperature: 0.0,
        top_p: None,
        frequency_penalty: None,
        presence_penalty: None,
    };

    /// Reasoning, topic explanations and learning objectives for a finished plan
    pub const EXPLANATORY: Self = Self {
        temperature: 0.0,
        top_p: Some(0.6),
        frequency_penalty: Some(0.2),
        presence_penalty: Some(0.1),
    };

    /// Background-level table; slightly looser wording than `EXPLANATORY`
    pub const BACKGROUND: Self = Self {
        temperature: 0.2,
        top_p: Some(0.6),
        frequency_penalty: Some(0.2),
        presence_penalty: Some(0.1),
    };
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model API key not set (expected in ${0})")]
    MissingCredential(String),

    #[error("model request timed out after {0}s")]
    Timeout(u64),

    #[error("model transport error: {0}")]
    Transport(String),

    #[error("model API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("model returned an empty completion")]
    EmptyCompletion,

    #[error("invalid model response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send an ordered message list and return the completion text
    async fn complete(
        &self,
        messages: &[ChatMessage],
        sampling: SamplingParams,
    ) -> Result<String, ModelError>;
}

// =============================================================================
// OpenAI-compatible chat completions
// =============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(flatten)]
    sampling: SamplingParams,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiClient {
    http: HttpClient,
    base_url: String,
    model: String,
    api_key: String,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(config: &ModelConfig, api_key: impl Into<String>) -> Result<Self, ModelError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ModelError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Build a client with the key read from the configured environment variable
    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        let key = config
            .api_key()
            .ok_or_else(|| ModelError::MissingCredential(config.api_key_env.clone()))?;
        Self::new(config, key)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn map_transport(&self, e: reqwest::Error) -> ModelError {
        if e.is_timeout() {
            ModelError::Timeout(self.timeout_secs)
        } else if e.is_decode() {
            ModelError::InvalidResponse(e.to_string())
        } else {
            ModelError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        sampling: SamplingParams,
    ) -> Result<String, ModelError> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            sampling,
        };

        tracing::debug!(model = %self.model, messages = messages.len(), "sending completion request");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| self.map_transport(e))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(ModelError::EmptyCompletion);
        }

        Ok(content)
    }
}
