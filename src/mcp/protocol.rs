//! JSON-RPC 2.0 envelope and MCP error codes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

// Standard JSON-RPC codes
pub const JSON_RPC_PARSE_ERROR: i64 = -32700;
pub const JSON_RPC_INVALID_REQUEST: i64 = -32600;
pub const JSON_RPC_METHOD_NOT_FOUND: i64 = -32601;
pub const JSON_RPC_INVALID_PARAMS: i64 = -32602;
pub const JSON_RPC_INTERNAL_ERROR: i64 = -32603;

// Implementation-defined server range
pub const JSON_RPC_SERVER_ERROR: i64 = -32000;
pub const JSON_RPC_SERVER_NOT_FOUND: i64 = -32001;
pub const JSON_RPC_SERVER_UNAUTHORIZED: i64 = -32002;
pub const JSON_RPC_SERVER_FORBIDDEN: i64 = -32003;
pub const JSON_RPC_SERVER_RESOURCE_NOT_FOUND: i64 = -32004;
pub const JSON_RPC_SERVER_RATE_LIMIT: i64 = -32005;

// Common MCP usages of the server range
pub const MCP_INVALID_ACCESS: i64 = -32001;
pub const MCP_TOOL_ERROR: i64 = -32002;
pub const MCP_FETCH_ERROR: i64 = -32003;
pub const MCP_RESOURCE_NOT_FOUND: i64 = -32004;
pub const MCP_TIMEOUT: i64 = -32005;

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_TOOLS_LIST: &str = "tools/list";
pub const METHOD_TOOLS_CALL: &str = "tools/call";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(default = "jsonrpc_version")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcRequest {
    pub fn new(id: u64, method: &str, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(Value::from(id)),
            method: method.to_string(),
            params: Some(params),
        }
    }

    /// `params.<key>`, if present.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.as_ref().and_then(|params| params.get(key))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default = "jsonrpc_version")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn method_not_found(id: Option<Value>) -> Self {
        Self::error(id, JSON_RPC_METHOD_NOT_FOUND, "Method not found")
    }

    pub fn internal_error(id: Option<Value>, message: impl Into<String>) -> Self {
        Self::error(id, JSON_RPC_INTERNAL_ERROR, message)
    }
}

fn jsonrpc_version() -> String {
    JSONRPC_VERSION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_response_keeps_null_id() {
        let response = RpcResponse::error(None, JSON_RPC_PARSE_ERROR, "bad json");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "bad json"}})
        );
    }

    #[test]
    fn request_without_params_or_id_parses() {
        let request: RpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "tools/list"})).unwrap();
        assert_eq!(request.method, METHOD_TOOLS_LIST);
        assert!(request.id.is_none());
        assert!(request.param("name").is_none());
    }
}
