//! Configuration schema for interlink.toml.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Model backend transport.
    pub llm: LlmSettings,

    /// MCP endpoint exposed by `interlink serve`.
    pub server: ServerSettings,

    /// Agent run by `interlink ask`.
    pub agent: AgentSettings,

    /// Log level (debug, info, warn, error).
    pub log_level: Option<String>,
}

/// Chat-completions backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// OpenAI-compatible API base URL.
    pub base_url: String,

    /// Bearer token. Usually supplied through `OPENAI_API_KEY`.
    pub api_key: String,

    /// Model used when the agent does not name one.
    pub default_model: String,

    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,

    /// Retries after the first attempt.
    pub max_retries: u32,

    /// The Nth retry waits N times this long.
    pub retry_backoff_ms: u64,

    /// Statuses treated as failures even when the backend reports success.
    pub retryable_statuses: Vec<u16>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: String::new(),
            default_model: "gpt-4o-mini".into(),
            connect_timeout_secs: 60,
            read_timeout_secs: 60,
            max_retries: 3,
            retry_backoff_ms: 1000,
            retryable_statuses: vec![502, 503, 504],
        }
    }
}

impl LlmSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// MCP server identity and mount point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub name: String,
    pub version: String,
    pub relative_path: String,
    /// Listen address for `interlink serve`.
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            name: "MCP Server".into(),
            version: "1.0.0".into(),
            relative_path: "/mcp".into(),
            bind: "127.0.0.1:8080".into(),
        }
    }
}

/// Declarative part of an agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub name: String,
    pub instructions: String,
    /// Backend provider, e.g. `open_ai`.
    pub provider: String,
    /// Overrides `llm.default_model`.
    pub model: Option<String>,
    /// Overrides `llm.api_key`.
    pub api_key: Option<String>,
    pub mcp_servers: BTreeMap<String, McpServerSettings>,
    /// JSON schema for structured output, either a table or a JSON string.
    pub output_schema: Option<SchemaSource>,
    /// Model calls allowed per prompt; 0 disables the cap.
    pub max_iterations: usize,
    pub cache_tool_results: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: "interlink".into(),
            instructions: "You are a helpful assistant.".into(),
            provider: "open_ai".into(),
            model: None,
            api_key: None,
            mcp_servers: BTreeMap::new(),
            output_schema: None,
            max_iterations: 25,
            cache_tool_results: false,
        }
    }
}

/// Remote MCP server the agent pulls tools from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerSettings {
    pub url: String,
    #[serde(default)]
    pub allowed_tools: Option<Vec<String>>,
}

/// An output schema given inline or as JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaSource {
    Json(String),
    Inline(Value),
}

impl SchemaSource {
    pub fn resolve(&self) -> serde_json::Result<Value> {
        match self {
            Self::Json(text) => serde_json::from_str(text),
            Self::Inline(value) => Ok(value.clone()),
        }
    }
}
