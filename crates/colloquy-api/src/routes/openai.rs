use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

const FALLBACK_MODEL: &str = "colloquy";

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<CompletionMessage>>,
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CompletionMessage {
    pub role: String,
    /// A string, or an array of `{type, text}` parts
    #[serde(default)]
    #[schema(value_type = Object)]
    pub content: Value,
}

impl CompletionMessage {
    fn text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            Value::Array(parts) => parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(""),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

impl Usage {
    /// Rough estimate: four characters per token
    fn estimate(prompt: &str, completion: &str) -> Self {
        let prompt_tokens = prompt.chars().count() / 4;
        let completion_tokens = completion.chars().count() / 4;
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

fn invalid_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": {
                "message": message,
                "type": "invalid_request_error"
            }
        })),
    )
        .into_response()
}

/// OpenAI-compatible chat completion driven by the last user message
#[utoipa::path(
    post,
    path = "/v1/chat/completions",
    request_body = ChatCompletionRequest,
    responses(
        (status = 200, description = "chat.completion object, or SSE chunks when stream is true"),
        (status = 400, description = "No user message")
    ),
    tag = "openai"
)]
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatCompletionRequest>,
) -> Response {
    let Some(messages) = req.messages else {
        return invalid_request("Missing or invalid messages field");
    };

    let user_message = messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map(CompletionMessage::text)
        .unwrap_or_default();
    if user_message.trim().is_empty() {
        return invalid_request("No user message found");
    }

    let reply = state.assistant.process(&user_message).await;

    let model = match req.model.filter(|m| !m.is_empty()) {
        Some(model) => model,
        None => configured_model(&state).await,
    };
    let created = chrono::Utc::now();
    let id = format!("chatcmpl-{}", created.timestamp_millis());

    if req.stream {
        return stream_reply(id, created.timestamp(), model, reply).into_response();
    }

    Json(json!({
        "id": id,
        "object": "chat.completion",
        "created": created.timestamp(),
        "model": model,
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": reply },
            "finish_reason": "stop"
        }],
        "usage": Usage::estimate(&user_message, &reply),
    }))
    .into_response()
}

/// Replay a finished reply as `chat.completion.chunk` events
fn stream_reply(
    id: String,
    created: i64,
    model: String,
    reply: String,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let chunk = |delta: Value, finish_reason: Option<&str>| {
        json!({
            "id": id,
            "object": "chat.completion.chunk",
            "created": created,
            "model": model,
            "choices": [{
                "index": 0,
                "delta": delta,
                "finish_reason": finish_reason
            }]
        })
    };

    let mut payloads = vec![chunk(json!({ "role": "assistant" }), None)];
    payloads.extend(
        reply
            .split_inclusive(' ')
            .map(|piece| chunk(json!({ "content": piece }), None)),
    );
    payloads.push(chunk(json!({}), Some("stop")));

    let mut events: Vec<Event> = payloads
        .into_iter()
        .map(|payload| Event::default().data(payload.to_string()))
        .collect();
    events.push(Event::default().data("[DONE]"));

    Sse::new(stream::iter(events.into_iter().map(Ok::<Event, Infallible>)))
}

async fn configured_model(state: &AppState) -> String {
    state
        .assistant
        .provider_config()
        .await
        .map(|p| p.model_name)
        .unwrap_or_else(|| FALLBACK_MODEL.to_string())
}

/// Models this server answers for
#[utoipa::path(
    get,
    path = "/v1/models",
    responses(
        (status = 200, description = "Model list")
    ),
    tag = "openai"
)]
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "object": "list",
        "data": [{
            "id": configured_model(&state).await,
            "object": "model",
            "created": chrono::Utc::now().timestamp(),
            "owned_by": "colloquy"
        }]
    }))
}
