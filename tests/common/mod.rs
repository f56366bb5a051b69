#![allow(dead_code)]

use axum::Router;
use interlink::config::{LlmSettings, ServerSettings};
use interlink::mcp::McpServer;
use interlink::tools::builtin::builtin_tools;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral local port.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Live MCP server publishing the built-in tools at `/mcp`.
pub async fn spawn_builtin_mcp_server() -> String {
    let mut server = McpServer::new(ServerSettings::default());
    for tool in builtin_tools() {
        server.register_tool(tool).unwrap();
    }
    let addr = spawn(Arc::new(server).router(Router::new())).await;
    format!("http://{}/mcp", addr)
}

pub fn llm_settings(addr: SocketAddr) -> LlmSettings {
    LlmSettings {
        base_url: format!("http://{}/v1", addr),
        api_key: "sk-test".into(),
        default_model: "test-model".into(),
        connect_timeout_secs: 5,
        read_timeout_secs: 5,
        max_retries: 3,
        retry_backoff_ms: 10,
        ..LlmSettings::default()
    }
}

pub fn completion(message: Value, finish_reason: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": message,
            "finish_reason": finish_reason
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

pub fn final_answer(content: &str) -> Value {
    completion(json!({"role": "assistant", "content": content}), "stop")
}

pub fn tool_call(id: &str, name: &str, arguments: Value) -> Value {
    completion(
        json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": id,
                "type": "function",
                "function": {"name": name, "arguments": arguments.to_string()}
            }]
        }),
        "tool_calls",
    )
}
