//! Error taxonomy for the agent core.

use crate::mcp::McpError;
use thiserror::Error;

/// Failure talking to the language-model backend.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Non-success status, or a status listed as retryable.
    #[error("Request fail\nRequest: {url}\n{request}\nResponse: {status}\n{body}")]
    RequestFail {
        url: String,
        request: String,
        status: u16,
        body: String,
    },

    #[error("request to {url} failed: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Setup(#[source] reqwest::Error),
}

impl TransportError {
    /// Whether the retry policy applies to this failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFail { .. } => true,
            Self::Connection { source, .. } => source.is_connect() || source.is_timeout(),
            Self::Decode { .. } | Self::Setup(_) => false,
        }
    }

    /// HTTP status of the failed response, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFail { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A parameter type that has no JSON schema mapping.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Type not serializable {0}")]
    Unsupported(String),

    #[error("attribute `{attribute}`: {source}")]
    Attribute {
        attribute: String,
        #[source]
        source: Box<SchemaError>,
    },
}

#[derive(Debug, Error)]
#[error("Tool serialization error: {tool}")]
pub struct ToolSerializationError {
    pub tool: String,
    #[source]
    pub source: SchemaError,
}

#[derive(Debug, Error)]
#[error("Undefined tool {0}")]
pub struct UndefinedTool(pub String);

/// Errors that escape an agent call.
///
/// Tool failures never show up here; they are turned into tool messages.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Serialization(#[from] ToolSerializationError),

    #[error("MCP server '{server}' could not be loaded: {source}")]
    McpServer {
        server: String,
        #[source]
        source: McpError,
    },

    #[error("tool '{0}' is registered more than once")]
    DuplicateTool(String),

    #[error("backend response contained no choices")]
    EmptyResponse,

    #[error("no final answer after {0} model calls")]
    IterationLimit(usize),
}
