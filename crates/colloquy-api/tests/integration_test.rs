use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::IntoResponse,
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

use colloquy_api::{build_router, error::ApiError, AppState, Config};
use colloquy_core::{Assistant, NOT_READY_MESSAGE};
use colloquy_llm::{
    ChatClient, HttpResponse, Message, NormalizedResponse, ProviderConfig, Transport,
};
use colloquy_persist::MemoryPersistenceClient;

struct EchoClient {
    config: ProviderConfig,
}

#[async_trait]
impl ChatClient for EchoClient {
    async fn complete(&self, messages: &[Message]) -> NormalizedResponse {
        let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        NormalizedResponse::success(format!("echo {}", last))
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

struct NullTransport;

#[async_trait]
impl Transport for NullTransport {
    async fn post(&self, _url: &str, _body: &str, _headers: &HashMap<String, String>) -> HttpResponse {
        HttpResponse::failed(0, "offline")
    }

    async fn get(&self, _url: &str, _headers: &HashMap<String, String>) -> HttpResponse {
        HttpResponse::failed(0, "offline")
    }
}

fn app_with(assistant: Assistant) -> Router {
    let mut config = Config::default();
    config.server.static_dir = "does-not-exist".to_string();
    build_router(Arc::new(AppState::new(config, Arc::new(assistant))))
}

fn app() -> Router {
    let assistant = Assistant::builder()
        .client(Arc::new(EchoClient {
            config: ProviderConfig::openai("sk-test").with_model("gpt-4o-mini"),
        }))
        .transport(Arc::new(NullTransport))
        .with_persistence(Arc::new(MemoryPersistenceClient::new()))
        .build()
        .unwrap();
    app_with(assistant)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn send_raw(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).to_string())
}

#[tokio::test]
async fn test_api_error_response() {
    let error = ApiError::BadRequest("Test error".to_string());
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_chat_creates_and_continues_conversation() {
    let app = app();

    let (status, first) = send(&app, "POST", "/api/chat", Some(json!({"message": "hello"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "success");
    assert_eq!(first["response"], "echo hello");
    let id = first["conversation_id"].as_str().unwrap().to_string();

    let (_, second) = send(
        &app,
        "POST",
        "/api/chat",
        Some(json!({"message": "again", "conversation_id": id})),
    )
    .await;
    assert_eq!(second["conversation_id"], id.as_str());

    let (status, messages) = send(
        &app,
        "GET",
        &format!("/api/conversations/messages?conversation_id={}", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let contents: Vec<&str> = messages["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["hello", "echo hello", "again", "echo again"]);
    assert_eq!(messages["messages"][0]["role"], "user");
}

#[tokio::test]
async fn test_unknown_conversation_starts_new_one() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/chat",
        Some(json!({"message": "hi", "conversation_id": "missing"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["conversation_id"], "missing");
}

#[tokio::test]
async fn test_chat_rejects_empty_and_long_messages() {
    let app = app();

    let (status, _) = send(&app, "POST", "/api/chat", Some(json!({"message": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let long = "a".repeat(8001);
    let (status, body) = send(&app, "POST", "/api/chat", Some(json!({"message": long}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["current_length"], 8001);

    // Nothing was stored for rejected messages
    let (_, list) = send(&app, "GET", "/api/conversations", None).await;
    assert!(list["conversations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_and_delete_conversations() {
    let app = app();
    for text in ["one", "two", "three"] {
        send(&app, "POST", "/api/chat", Some(json!({"message": text}))).await;
    }

    let (_, list) = send(&app, "GET", "/api/conversations?limit=2", None).await;
    let items = list["conversations"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["message_count"], 2);
    assert!(items[0]["created_at"].is_i64());

    let id = items[0]["id"].as_str().unwrap().to_string();
    let (status, body) = send(
        &app,
        "DELETE",
        "/api/conversations",
        Some(json!({"conversation_id": id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = send(
        &app,
        "DELETE",
        "/api/conversations",
        Some(json!({"conversation_id": id})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_messages_endpoint_errors() {
    let app = app();

    let (status, _) = send(&app, "GET", "/api/conversations/messages", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "GET",
        "/api/conversations/messages?conversation_id=nope",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_status_reports_counts() {
    let app = app();
    send(&app, "POST", "/api/chat", Some(json!({"message": "count me"}))).await;

    let (status, body) = send(&app, "GET", "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["assistant_available"], true);
    assert_eq!(body["state"], "idle");
    assert_eq!(body["provider"], "openai");
    assert_eq!(body["total_conversations"], 1);
    assert_eq!(body["total_messages"], 2);
}

#[tokio::test]
async fn test_uninitialized_assistant_apologizes() {
    let app = app_with(Assistant::builder().transport(Arc::new(NullTransport)).build().unwrap());

    let (status, body) = send(&app, "POST", "/api/chat", Some(json!({"message": "hi"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], NOT_READY_MESSAGE);

    let (_, status_body) = send(&app, "GET", "/api/status", None).await;
    assert_eq!(status_body["assistant_available"], false);
}

#[tokio::test]
async fn test_switch_provider() {
    let app = app();

    let (status, body) = send(
        &app,
        "PUT",
        "/api/provider",
        Some(json!({"provider": "anthropic", "api_key": "sk-ant"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"], "anthropic");

    let (status, _) = send(
        &app,
        "PUT",
        "/api/provider",
        Some(json!({"provider": "openai", "temperature": 3.5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status_body) = send(&app, "GET", "/api/status", None).await;
    assert_eq!(status_body["provider"], "anthropic");
}

#[tokio::test]
async fn test_openai_completion() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/v1/chat/completions",
        Some(json!({
            "messages": [
                {"role": "system", "content": "ignored"},
                {"role": "user", "content": "first"},
                {"role": "assistant", "content": "x"},
                {"role": "user", "content": "latest question"}
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["object"], "chat.completion");
    assert!(body["id"].as_str().unwrap().starts_with("chatcmpl-"));
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["choices"][0]["message"]["content"], "echo latest question");
    assert_eq!(body["choices"][0]["finish_reason"], "stop");
    assert_eq!(body["usage"]["prompt_tokens"], 3);
}

#[tokio::test]
async fn test_openai_requires_user_message() {
    let app = app();

    let (status, body) = send(
        &app,
        "POST",
        "/v1/chat/completions",
        Some(json!({"messages": [{"role": "system", "content": "hi"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert_eq!(body["error"]["message"], "No user message found");

    let (status, body) = send(&app, "POST", "/v1/chat/completions", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Missing or invalid messages field");
}

#[tokio::test]
async fn test_openai_stream_replays_reply() {
    let app = app();
    let (status, text) = send_raw(
        &app,
        "POST",
        "/v1/chat/completions",
        json!({"stream": true, "messages": [{"role": "user", "content": "stream me"}]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("chat.completion.chunk"));
    assert!(text.contains("\"content\":\"echo \""));
    assert!(text.trim_end().ends_with("data: [DONE]"));
}

#[tokio::test]
async fn test_models_and_openapi() {
    let app = app();

    let (_, models) = send(&app, "GET", "/v1/models", None).await;
    assert_eq!(models["object"], "list");
    assert_eq!(models["data"][0]["owned_by"], "colloquy");

    let (status, doc) = send(&app, "GET", "/api/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/chat"].is_object());
}
