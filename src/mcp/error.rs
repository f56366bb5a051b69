use crate::errors::ToolSerializationError;
use thiserror::Error;

/// Failure of a remote MCP request.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Invalid tool: {0}")]
    ToolNotAllowed(String),

    #[error("MCP request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("MCP server at {url} returned invalid JSON: {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("MCP Error: {message}")]
    Rpc { code: i64, message: String },

    #[error("MCP Error: invalid result")]
    InvalidResult,

    #[error("MCP Error: tool '{0}' returned no content")]
    EmptyContent(String),
}

/// Rejected tool registration on [`super::McpServer`].
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Tool {0} already exists")]
    Duplicate(String),

    #[error(transparent)]
    Serialization(#[from] ToolSerializationError),
}
