//! MCP server exposing local tools over JSON-RPC.
//!
//! Mounted on a single POST route; every other request falls through to the
//! downstream router untouched. Protocol-level failures are JSON-RPC error
//! bodies with HTTP 200. Only an unparsable body (400) and a response that
//! cannot be encoded (500) change the HTTP status.

use super::error::RegistrationError;
use super::protocol::{
    RpcRequest, RpcResponse, JSON_RPC_PARSE_ERROR, METHOD_INITIALIZE, METHOD_TOOLS_CALL,
    METHOD_TOOLS_LIST, PROTOCOL_VERSION,
};
use crate::config::ServerSettings;
use crate::tools::serializer::{self, ToolSerialization};
use crate::tools::Tool;
use anyhow::{anyhow, bail, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

struct ToolSpecification {
    tool: Arc<dyn Tool>,
    serialization: ToolSerialization,
}

/// MCP endpoint with its own tool table.
///
/// Tools are registered through `&mut self` before the server is shared;
/// once wrapped in an `Arc` for [`McpServer::router`] the table is read-only.
pub struct McpServer {
    settings: ServerSettings,
    tools: Vec<ToolSpecification>,
}

impl McpServer {
    pub fn new(settings: ServerSettings) -> Self {
        Self {
            settings,
            tools: Vec::new(),
        }
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Register a tool under its serialized name.
    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistrationError> {
        let serialization = serializer::serialize(tool.as_ref())?;
        if self.find(&serialization.name).is_some() {
            return Err(RegistrationError::Duplicate(serialization.name));
        }

        debug!("Registered MCP tool {}", serialization.name);
        self.tools.push(ToolSpecification {
            tool,
            serialization,
        });
        Ok(())
    }

    pub fn clear_tools(&mut self) {
        self.tools.clear();
    }

    /// Serializations of every registered tool, in registration order.
    pub fn tools_serializations(&self) -> Vec<ToolSerialization> {
        self.tools
            .iter()
            .map(|entry| entry.serialization.clone())
            .collect()
    }

    /// Run a registered tool. A panicking tool is reported as an error.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String> {
        let entry = self
            .find(name)
            .ok_or_else(|| anyhow!("Tool {} not found", name))?;

        info!("Calling tool {} with {}", name, arguments);
        let tool = entry.tool.clone();
        match tokio::spawn(async move { tool.call(arguments).await }).await {
            Ok(result) => result,
            Err(join) if join.is_panic() => bail!("Tool {} panicked", name),
            Err(join) => Err(join.into()),
        }
    }

    /// Router serving POST `relative_path`; everything else goes to
    /// `downstream`.
    pub fn router(self: Arc<Self>, downstream: Router) -> Router {
        let path = self.settings.relative_path.clone();
        Router::new()
            .route(
                &path,
                post(handle_post).fallback_service(downstream.clone()),
            )
            .with_state(self)
            .fallback_service(downstream)
    }

    /// Handle one raw request body.
    pub async fn handle(&self, body: &[u8]) -> Response {
        let request: RpcRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejected MCP request: {}", e);
                return error_response(StatusCode::BAD_REQUEST, JSON_RPC_PARSE_ERROR, e.to_string());
            }
        };

        let response = self.dispatch(request).await;
        encode_response(&response)
    }

    async fn dispatch(&self, request: RpcRequest) -> RpcResponse {
        debug!(method = %request.method, "Received MCP request");
        let id = request.id.clone();

        match request.method.as_str() {
            METHOD_INITIALIZE => RpcResponse::success(id, self.initialize_result()),
            METHOD_TOOLS_LIST => RpcResponse::success(
                id,
                json!({ "tools": self.tools_serializations() }),
            ),
            METHOD_TOOLS_CALL => self.handle_tool_call(&request).await,
            other => {
                warn!("Unknown MCP method {}", other);
                RpcResponse::method_not_found(id)
            }
        }
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {
                    "list": true,
                    "call": true
                }
            },
            "serverInfo": {
                "name": self.settings.name,
                "version": self.settings.version
            }
        })
    }

    async fn handle_tool_call(&self, request: &RpcRequest) -> RpcResponse {
        let id = request.id.clone();
        let Some(name) = request.param("name").and_then(Value::as_str) else {
            return RpcResponse::internal_error(id, "Missing tool name");
        };
        let arguments = request
            .param("arguments")
            .filter(|args| !args.is_null())
            .cloned()
            .unwrap_or_else(|| json!({}));

        match self.call_tool(name, arguments).await {
            Ok(text) => RpcResponse::success(
                id,
                json!({ "content": [{ "type": "text", "text": text }] }),
            ),
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                RpcResponse::internal_error(id, e.to_string())
            }
        }
    }

    fn find(&self, name: &str) -> Option<&ToolSpecification> {
        self.tools.iter().find(|entry| entry.serialization.name == name)
    }
}

async fn handle_post(State(server): State<Arc<McpServer>>, body: Bytes) -> Response {
    server.handle(&body).await
}

/// 200 with the encoded body, or 500 when encoding itself fails.
fn encode_response<T: Serialize>(response: &T) -> Response {
    match serde_json::to_vec(response) {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            bytes,
        )
            .into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            super::protocol::JSON_RPC_INTERNAL_ERROR,
            e.to_string(),
        ),
    }
}

fn error_response(status: StatusCode, code: i64, message: String) -> Response {
    (status, Json(RpcResponse::error(None, code, message))).into_response()
}
