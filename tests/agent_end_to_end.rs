mod common;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use common::{final_answer, llm_settings, spawn, spawn_builtin_mcp_server, tool_call};
use interlink::agent::{Agent, AgentConfiguration, Session};
use interlink::config::McpServerSettings;
use interlink::errors::AgentError;
use interlink::mcp::McpError;
use interlink::tools::builtin::sum_tool;
use interlink::tools::FunctionTool;
use interlink::types::{ChatRole, Message};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct Backend {
    script: Arc<Mutex<VecDeque<Value>>>,
    requests: Arc<Mutex<Vec<Value>>>,
}

async fn completions(State(backend): State<Backend>, Json(body): Json<Value>) -> Json<Value> {
    backend.requests.lock().await.push(body);
    let next = backend.script.lock().await.pop_front();
    Json(next.unwrap_or_else(|| final_answer("script exhausted")))
}

async fn spawn_backend(script: Vec<Value>) -> (Backend, std::net::SocketAddr) {
    let backend = Backend {
        script: Arc::new(Mutex::new(script.into())),
        ..Backend::default()
    };
    let addr = spawn(
        Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(backend.clone()),
    )
    .await;
    (backend, addr)
}

#[tokio::test]
async fn answers_without_tools() {
    let (backend, addr) = spawn_backend(vec![final_answer("A")]).await;
    let config = AgentConfiguration::new("plain").with_instructions("Be brief");
    let mut agent = Agent::new(Session::new(config), &llm_settings(addr)).unwrap();

    assert_eq!(agent.call("Q").await.unwrap(), "A");
    assert_eq!(
        agent.session().messages(),
        [Message::user("Q"), Message::assistant(Some("A".into()))]
    );

    let requests = backend.requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["tools"], json!([]));
    assert_eq!(requests[0]["messages"][0], json!({"role": "system", "content": "Be brief"}));
    assert!(requests[0].get("response_format").is_none());
}

#[tokio::test]
async fn local_tool_call_round_trip() {
    let (backend, addr) = spawn_backend(vec![
        tool_call("call_1", "sum", json!({"a": 1, "b": 2})),
        final_answer("5"),
    ])
    .await;
    let config = AgentConfiguration::new("math").with_tool(Arc::new(sum_tool()));
    let mut agent = Agent::new(Session::new(config), &llm_settings(addr)).unwrap();

    assert_eq!(agent.call("What is 1 + 2?").await.unwrap(), "5");

    let messages = agent.session().messages();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[1].role, ChatRole::Assistant);
    assert_eq!(messages[2], Message::tool("call_1", r#"{"result":3.0}"#));

    let requests = backend.requests.lock().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0]["tool_choice"], "auto");
    assert_eq!(requests[0]["tools"][0]["function"]["name"], "sum");

    let second = &requests[1]["messages"];
    assert_eq!(second.as_array().unwrap().len(), 4);
    assert_eq!(second[2]["tool_calls"][0]["id"], "call_1");
    assert_eq!(second[3], json!({"role": "tool", "content": "{\"result\":3.0}", "tool_call_id": "call_1"}));
}

#[tokio::test]
async fn remote_tools_are_proxied_through_mcp() {
    let mcp_url = spawn_builtin_mcp_server().await;
    let (backend, addr) = spawn_backend(vec![
        tool_call("call_1", "math_sum", json!({"a": 1.5, "b": 2})),
        final_answer("3.5"),
    ])
    .await;
    let config = AgentConfiguration::new("remote").with_mcp_server(
        "math",
        McpServerSettings {
            url: mcp_url,
            allowed_tools: Some(vec!["sum".into()]),
        },
    );
    let mut agent = Agent::new(Session::new(config), &llm_settings(addr)).unwrap();

    assert_eq!(agent.call("Add 1.5 and 2").await.unwrap(), "3.5");

    let requests = backend.requests.lock().await;
    let tools = requests[0]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["function"]["name"], "math_sum");
    assert_eq!(tools[0]["function"]["description"], "Add two numbers.");
    assert_eq!(tools[0]["function"]["parameters"]["required"], json!(["a", "b"]));

    let tool_message = &agent.session().messages()[2];
    let block: Value = serde_json::from_str(tool_message.content.as_deref().unwrap()).unwrap();
    assert_eq!(block, json!({"type": "text", "text": "{\"result\":3.5}"}));
}

#[tokio::test]
async fn remote_tool_errors_are_contained() {
    let mcp_url = spawn_builtin_mcp_server().await;
    let (_backend, addr) = spawn_backend(vec![
        tool_call("call_1", "math_sum", json!({"a": 1})),
        final_answer("could not add"),
    ])
    .await;
    let config = AgentConfiguration::new("remote").with_mcp_server(
        "math",
        McpServerSettings {
            url: mcp_url,
            allowed_tools: None,
        },
    );
    let mut agent = Agent::new(Session::new(config), &llm_settings(addr)).unwrap();

    assert_eq!(agent.call("Add").await.unwrap(), "could not add");
    assert_eq!(
        agent.session().messages()[2].content.as_deref(),
        Some("Error: MCP Error: b is required")
    );
}

#[tokio::test]
async fn unreachable_mcp_server_fails_before_backend_traffic() {
    let (backend, addr) = spawn_backend(vec![final_answer("A")]).await;
    let config = AgentConfiguration::new("remote").with_mcp_server(
        "gone",
        McpServerSettings {
            url: "http://127.0.0.1:1/mcp".into(),
            allowed_tools: None,
        },
    );
    let mut agent = Agent::new(Session::new(config), &llm_settings(addr)).unwrap();

    let err = agent.call("Q").await.unwrap_err();
    assert!(matches!(
        err,
        AgentError::McpServer { ref server, source: McpError::Transport { .. } } if server == "gone"
    ));
    assert!(backend.requests.lock().await.is_empty());
}

#[tokio::test]
async fn local_and_remote_name_collision_is_rejected() {
    let mcp_url = spawn_builtin_mcp_server().await;
    let (_backend, addr) = spawn_backend(Vec::new()).await;
    let config = AgentConfiguration::new("clash")
        .with_tool(Arc::new(FunctionTool::new("MathSum", |_| async {
            Ok::<_, anyhow::Error>(json!(0))
        })))
        .with_mcp_server(
            "math",
            McpServerSettings {
                url: mcp_url,
                allowed_tools: Some(vec!["sum".into()]),
            },
        );
    let mut agent = Agent::new(Session::new(config), &llm_settings(addr)).unwrap();

    let err = agent.call("Q").await.unwrap_err();
    assert!(matches!(err, AgentError::DuplicateTool(ref name) if name == "math_sum"));
}
