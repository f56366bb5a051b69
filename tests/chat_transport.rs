mod common;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use common::{final_answer, llm_settings, spawn};
use interlink::errors::TransportError;
use interlink::llm::{ChatBackend, ChatClient, ChatRequest};
use interlink::types::Message;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct Stub {
    script: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

impl Stub {
    fn new(script: Vec<(StatusCode, String)>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            ..Self::default()
        }
    }

    async fn requests(&self) -> Vec<(Option<String>, Value)> {
        self.requests.lock().await.clone()
    }
}

async fn completions(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    stub.requests.lock().await.push((auth, body));
    stub.script
        .lock()
        .await
        .pop_front()
        .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, "script exhausted".into()))
}

async fn spawn_stub(stub: &Stub) -> std::net::SocketAddr {
    spawn(
        Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(stub.clone()),
    )
    .await
}

fn busy(status: StatusCode) -> (StatusCode, String) {
    (status, json!({"error": {"message": "overloaded"}}).to_string())
}

fn ok(body: Value) -> (StatusCode, String) {
    (StatusCode::OK, body.to_string())
}

fn request() -> ChatRequest {
    ChatRequest {
        messages: vec![Message::system("Be brief"), Message::user("Q")],
        ..ChatRequest::default()
    }
}

#[tokio::test]
async fn retries_overloaded_backend_until_success() {
    let stub = Stub::new(vec![
        busy(StatusCode::SERVICE_UNAVAILABLE),
        busy(StatusCode::BAD_GATEWAY),
        ok(final_answer("A")),
    ]);
    let addr = spawn_stub(&stub).await;
    let client = ChatClient::new(&llm_settings(addr)).unwrap();

    let response = client.chat_completions(request()).await.unwrap();
    let choice = response.into_first_choice().unwrap();
    assert_eq!(choice.message.content.as_deref(), Some("A"));

    let requests = stub.requests().await;
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].0.as_deref(), Some("Bearer sk-test"));
    assert_eq!(requests[0].1["model"], "test-model");
    assert_eq!(requests[0].1["tool_choice"], "none");
    assert_eq!(
        requests[0].1["messages"],
        json!([
            {"role": "system", "content": "Be brief"},
            {"role": "user", "content": "Q"}
        ])
    );
    assert_eq!(requests[0].1, requests[2].1);
}

#[tokio::test]
async fn retry_waits_grow_linearly() {
    let stub = Stub::new(vec![
        busy(StatusCode::SERVICE_UNAVAILABLE),
        busy(StatusCode::SERVICE_UNAVAILABLE),
        ok(final_answer("A")),
    ]);
    let addr = spawn_stub(&stub).await;
    let settings = interlink::config::LlmSettings {
        retry_backoff_ms: 50,
        ..llm_settings(addr)
    };
    let client = ChatClient::new(&settings).unwrap();

    let started = tokio::time::Instant::now();
    client.chat_completions(request()).await.unwrap();
    let elapsed = started.elapsed();

    // 50ms before the first retry, 100ms before the second.
    assert!(elapsed >= Duration::from_millis(150), "{:?}", elapsed);
    assert_eq!(stub.requests().await.len(), 3);
}

#[tokio::test]
async fn surfaces_last_failure_after_max_retries() {
    let stub = Stub::new(vec![busy(StatusCode::SERVICE_UNAVAILABLE); 5]);
    let addr = spawn_stub(&stub).await;
    let settings = interlink::config::LlmSettings {
        max_retries: 2,
        ..llm_settings(addr)
    };
    let client = ChatClient::new(&settings).unwrap();

    let err = client.chat_completions(request()).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    let text = err.to_string();
    assert!(text.starts_with("Request fail\nRequest: http://"));
    assert!(text.contains("/v1/chat/completions"));
    assert!(text.contains("Response: 503"));
    assert!(text.contains("overloaded"));
    assert_eq!(stub.requests().await.len(), 3);
}

#[tokio::test]
async fn client_errors_fail_once_retries_are_spent() {
    let stub = Stub::new(vec![busy(StatusCode::BAD_REQUEST), ok(final_answer("late"))]);
    let addr = spawn_stub(&stub).await;
    let settings = interlink::config::LlmSettings {
        max_retries: 0,
        ..llm_settings(addr)
    };
    let client = ChatClient::new(&settings).unwrap();

    let err = client.chat_completions(request()).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(stub.requests().await.len(), 1);
}

#[tokio::test]
async fn undecodable_body_is_not_retried() {
    let stub = Stub::new(vec![(StatusCode::OK, "<html>gateway</html>".into())]);
    let addr = spawn_stub(&stub).await;
    let client = ChatClient::new(&llm_settings(addr)).unwrap();

    let err = client.chat_completions(request()).await.unwrap_err();
    assert!(matches!(err, TransportError::Decode { .. }));
    assert_eq!(stub.requests().await.len(), 1);
}

#[tokio::test]
async fn unreachable_backend_is_a_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let settings = interlink::config::LlmSettings {
        max_retries: 1,
        ..llm_settings(addr)
    };
    let client = ChatClient::new(&settings).unwrap();

    let err = client.chat_completions(request()).await.unwrap_err();
    assert!(matches!(err, TransportError::Connection { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn sends_tools_and_response_format() {
    let stub = Stub::new(vec![ok(final_answer(r#"{"ok":true}"#))]);
    let addr = spawn_stub(&stub).await;
    let client = ChatClient::new(&llm_settings(addr)).unwrap().with_api_key("sk-agent");

    let tool = json!({"type": "function", "function": {"name": "sum"}});
    let format = json!({"type": "json_schema", "json_schema": {"name": "answer"}});
    client
        .chat_completions(ChatRequest {
            messages: vec![Message::user("Q")],
            model: Some("gpt-4o".into()),
            tools: vec![tool.clone()],
            response_format: Some(format.clone()),
        })
        .await
        .unwrap();

    let (auth, body) = stub.requests().await.remove(0);
    assert_eq!(auth.as_deref(), Some("Bearer sk-agent"));
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["tools"], json!([tool]));
    assert_eq!(body["tool_choice"], "auto");
    assert_eq!(body["response_format"], format);
}
