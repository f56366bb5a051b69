//! Chat-completions transport with timeouts and retry.
//!
//! Speaks the OpenAI-compatible function-calling format.

use crate::config::LlmSettings;
use crate::errors::TransportError;
use crate::types::{Message, ToolCall};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Something that can answer a chat-completions request.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat_completions(&self, request: ChatRequest) -> Result<ChatResponse, TransportError>;
}

/// One backend call.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    /// Falls back to the client's default model.
    pub model: Option<String>,
    /// `{type:"function", function:{...}}` entries.
    pub tools: Vec<Value>,
    pub response_format: Option<Value>,
}

// -- OpenAI-compatible response types ----------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub message: AssistantMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// Token usage from a completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl ChatResponse {
    pub fn into_first_choice(self) -> Option<Choice> {
        self.choices.into_iter().next()
    }
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    base_url: String,
    api_key: String,
    default_model: String,
    max_retries: u32,
    retry_backoff: Duration,
    retryable_statuses: Vec<u16>,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(settings: &LlmSettings) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout())
            .read_timeout(settings.read_timeout())
            .build()
            .map_err(TransportError::Setup)?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            default_model: settings.default_model.clone(),
            max_retries: settings.max_retries,
            retry_backoff: settings.retry_backoff(),
            retryable_statuses: settings.retryable_statuses.clone(),
            http,
        })
    }

    /// Use a different credential than the process-wide one.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn request_body(&self, request: ChatRequest) -> Value {
        let tool_choice = if request.tools.is_empty() { "none" } else { "auto" };
        let mut body = json!({
            "model": request.model.unwrap_or_else(|| self.default_model.clone()),
            "messages": request.messages,
            "tools": request.tools,
            "tool_choice": tool_choice,
        });
        if let Some(format) = request.response_format {
            body["response_format"] = format;
        }
        body
    }

    /// POST with linear backoff: the Nth retry waits N * `retry_backoff`.
    async fn post(&self, relative_url: &str, body: &Value) -> Result<ChatResponse, TransportError> {
        let url = format!("{}{}", self.base_url, relative_url);
        let mut retry_count = 0;

        loop {
            match self.post_once(&url, body).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && retry_count < self.max_retries => {
                    retry_count += 1;
                    warn!("{} ({}/{})", e, retry_count, self.max_retries);
                    tokio::time::sleep(self.retry_backoff * retry_count).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_once(&self, url: &str, body: &Value) -> Result<ChatResponse, TransportError> {
        info!("POST {}", url);
        debug!("{}", body);

        let connection = |source| TransportError::Connection {
            url: url.to_string(),
            source,
        };

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(connection)?;

        let status = resp.status();
        let text = resp.text().await.map_err(connection)?;

        info!("Response {}", status.as_u16());
        debug!("{}", text);

        if !status.is_success() || self.retryable_statuses.contains(&status.as_u16()) {
            return Err(TransportError::RequestFail {
                url: url.to_string(),
                request: serde_json::to_string_pretty(body).unwrap_or_default(),
                status: status.as_u16(),
                body: text,
            });
        }

        let response: ChatResponse =
            serde_json::from_str(&text).map_err(|source| TransportError::Decode {
                url: url.to_string(),
                source,
            })?;

        if let Some(usage) = &response.usage {
            debug!(
                "Token usage: {} prompt + {} completion = {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn chat_completions(&self, request: ChatRequest) -> Result<ChatResponse, TransportError> {
        let body = self.request_body(request);
        self.post("/chat/completions", &body).await
    }
}
