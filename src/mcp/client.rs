//! MCP client for remote tool servers (JSON-RPC over one HTTP POST).

use super::error::McpError;
use super::protocol::{RpcRequest, RpcResponse, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST};
use crate::tools::ToolSerialization;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Client for a single remote MCP server.
///
/// Stateless apart from the optional allow-list: no session negotiation, no
/// batching, one POST per call.
#[derive(Debug)]
pub struct McpClient {
    url: String,
    allowed_tools: Option<Vec<String>>,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl McpClient {
    pub fn new(url: &str, allowed_tools: Option<Vec<String>>) -> Self {
        Self {
            url: url.to_string(),
            allowed_tools,
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Tools published by the server, restricted to the allow-list when one
    /// is configured. Server order is kept.
    pub async fn list_tools(&self) -> Result<Vec<ToolSerialization>, McpError> {
        let result = self.request(METHOD_TOOLS_LIST, json!({})).await?;
        let tools = result.get("tools").cloned().unwrap_or_else(|| json!([]));
        let tools: Vec<ToolSerialization> =
            serde_json::from_value(tools).map_err(|source| McpError::InvalidJson {
                url: self.url.clone(),
                source,
            })?;

        Ok(tools
            .into_iter()
            .filter(|tool| self.is_allowed(&tool.name))
            .collect())
    }

    /// Invoke a remote tool and return its first content block as a JSON
    /// string, e.g. `{"type":"text","text":"..."}`.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String, McpError> {
        if !self.is_allowed(name) {
            return Err(McpError::ToolNotAllowed(name.to_string()));
        }

        let result = self
            .request(
                METHOD_TOOLS_CALL,
                json!({ "name": name, "arguments": arguments }),
            )
            .await?;

        result
            .get("content")
            .and_then(Value::as_array)
            .and_then(|content| content.first())
            .map(Value::to_string)
            .ok_or_else(|| McpError::EmptyContent(name.to_string()))
    }

    fn is_allowed(&self, name: &str) -> bool {
        match &self.allowed_tools {
            Some(allowed) => allowed.iter().any(|tool| tool == name),
            None => true,
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);

        info!("POST {} -> {}", self.url, method);
        debug!("MCP params: {}", request.params.clone().unwrap_or_default());

        let transport = |source| McpError::Transport {
            url: self.url.clone(),
            source,
        };

        let resp = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(transport)?;

        info!("Response {}", status.as_u16());
        debug!("MCP response body: {}", body);

        let response: RpcResponse =
            serde_json::from_str(&body).map_err(|source| McpError::InvalidJson {
                url: self.url.clone(),
                source,
            })?;

        if let Some(error) = response.error {
            return Err(McpError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        response.result.ok_or(McpError::InvalidResult)
    }
}
