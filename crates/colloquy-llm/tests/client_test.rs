use async_trait::async_trait;
use colloquy_llm::{
    ChatClient, ClientFactory, CompletionErrorKind, HttpResponse, LlmClient, Message,
    ProviderConfig, ProviderKind, ReqwestTransport, Transport,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport returning a canned response and recording what it was sent
struct CannedTransport {
    response: HttpResponse,
    sent: Mutex<Vec<(String, String, HashMap<String, String>)>>,
}

impl CannedTransport {
    fn new(response: HttpResponse) -> Arc<Self> {
        Arc::new(Self {
            response,
            sent: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Transport for CannedTransport {
    async fn post(&self, url: &str, body: &str, headers: &HashMap<String, String>) -> HttpResponse {
        self.sent
            .lock()
            .unwrap()
            .push((url.to_string(), body.to_string(), headers.clone()));
        self.response.clone()
    }

    async fn get(&self, _url: &str, _headers: &HashMap<String, String>) -> HttpResponse {
        self.response.clone()
    }
}

#[tokio::test]
async fn test_client_posts_payload_to_endpoint() {
    let transport = CannedTransport::new(HttpResponse::ok(
        200,
        r#"{"choices":[{"message":{"content":"pong"}}]}"#,
    ));
    let config = ProviderConfig::openai("sk-test").with_model("gpt-4o-mini");
    let client = LlmClient::new(config, transport.clone());

    let response = client.complete(&[Message::user("ping")]).await;

    assert!(response.success);
    assert_eq!(response.content, "pong");
    assert_eq!(response.http_status, 200);

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (url, body, headers) = &sent[0];
    assert_eq!(url, "https://api.openai.com/v1/chat/completions");
    let body: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["messages"][0]["content"], "ping");
    assert_eq!(headers["Authorization"], "Bearer sk-test");
}

#[tokio::test]
async fn test_transport_failure_is_distinct_kind() {
    let transport = CannedTransport::new(HttpResponse {
        status_code: 401,
        body: r#"{"error":{"message":"Incorrect API key provided"}}"#.to_string(),
        headers: HashMap::new(),
        success: false,
        error_message: "HTTP 401".to_string(),
    });
    let client = LlmClient::new(ProviderConfig::openai("bad"), transport);

    let response = client.complete(&[Message::user("hi")]).await;

    assert!(!response.success);
    assert_eq!(response.error_kind, Some(CompletionErrorKind::Transport));
    assert_eq!(response.http_status, 401);
    assert!(response.error_message.starts_with("HTTP 401"));
    assert!(response.error_message.contains("Incorrect API key"));
}

#[tokio::test]
async fn test_connection_error_reports_status_zero() {
    let transport = CannedTransport::new(HttpResponse::failed(0, "Request failed: connection refused"));
    let client = LlmClient::new(ProviderConfig::anthropic("k"), transport);

    let response = client.complete(&[Message::user("hi")]).await;

    assert_eq!(response.error_kind, Some(CompletionErrorKind::Transport));
    assert_eq!(response.http_status, 0);
    assert_eq!(response.error_message, "Request failed: connection refused");
}

#[tokio::test]
async fn test_callback_receives_content_or_error() {
    let ok = LlmClient::new(
        ProviderConfig::new("local", "http://localhost/chat"),
        CannedTransport::new(HttpResponse::ok(200, r#"{"response":"streamed"}"#)),
    );
    let failing = LlmClient::new(
        ProviderConfig::new("local", "http://localhost/chat"),
        CannedTransport::new(HttpResponse::ok(200, r#"{"nothing":true}"#)),
    );

    let seen = Mutex::new(Vec::new());
    let record = |text: &str| seen.lock().unwrap().push(text.to_string());

    ok.complete_with_callback(&[Message::user("a")], &record).await;
    failing.complete_with_callback(&[Message::user("b")], &record).await;

    let seen = seen.into_inner().unwrap();
    assert_eq!(seen, vec!["streamed".to_string(), "Error: Unknown response format".to_string()]);
}

#[tokio::test]
async fn test_factory_rejects_invalid_config() {
    let transport = CannedTransport::new(HttpResponse::ok(200, "{}"));
    let config = ProviderConfig::openai("k").with_temperature(3.0);

    let result = ClientFactory::create_client_with_transport(config, transport);

    assert!(result.is_err());
}

#[tokio::test]
async fn test_factory_selects_adapter_from_provider_name() {
    let transport = CannedTransport::new(HttpResponse::ok(200, "{}"));

    let client = ClientFactory::create_client_with_transport(
        ProviderConfig::new("my-proxy", "http://localhost:8000/v1/chat"),
        transport,
    )
    .unwrap();

    assert_eq!(client.kind(), ProviderKind::Generic);
}

#[tokio::test]
async fn test_reqwest_transport_against_mock_server() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "ak-test")
        .match_header("anthropic-version", "2023-06-01")
        .match_header("user-agent", "Colloquy-Test/0.1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"content":[{"type":"text","text":"Hello!"}],"usage":{"input_tokens":5,"output_tokens":2}}"#)
        .create_async()
        .await;

    let transport = ReqwestTransport::builder()
        .timeout(Duration::from_secs(5))
        .user_agent("Colloquy-Test/0.1")
        .build()
        .unwrap();
    let mut config = ProviderConfig::anthropic("ak-test");
    config.api_endpoint = format!("{}/v1/messages", server.url());
    let client = LlmClient::new(config, Arc::new(transport));

    let response = client
        .complete(&[Message::system("be nice"), Message::user("Hi")])
        .await;

    mock.assert_async().await;
    assert!(response.success);
    assert_eq!(response.content, "Hello!");
    assert_eq!(response.metadata["output_tokens"], "2");
}

#[tokio::test]
async fn test_reqwest_transport_non_success_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat")
        .with_status(503)
        .with_body("upstream unavailable")
        .create_async()
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let response = transport
        .post(&format!("{}/chat", server.url()), "{}", &HashMap::new())
        .await;

    assert!(!response.success);
    assert_eq!(response.status_code, 503);
    assert_eq!(response.error_message, "HTTP 503");
    assert_eq!(response.body, "upstream unavailable");
}

#[tokio::test]
async fn test_reqwest_transport_get() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/models")
        .with_status(200)
        .with_header("x-request-id", "req-1")
        .with_body(r#"{"data":[]}"#)
        .create_async()
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let response = transport
        .get(&format!("{}/models", server.url()), &HashMap::new())
        .await;

    assert!(response.success);
    assert_eq!(response.headers.get("x-request-id").map(String::as_str), Some("req-1"));
}
