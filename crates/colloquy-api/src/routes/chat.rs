use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Longest accepted user message, in characters
pub const MAX_USER_MESSAGE_LENGTH: usize = 8000;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    /// Conversation to continue; missing or unknown ids start a new one
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub status: String,
    pub conversation_id: String,
    pub response: String,
}

/// Send one message and wait for the assistant's reply
///
/// Loading the requested conversation and processing the message are two
/// separate calls on the shared assistant. Concurrent requests for different
/// conversations can interleave between them.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 400, description = "Empty or oversized message")
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }

    let current_length = req.message.chars().count();
    if current_length > MAX_USER_MESSAGE_LENGTH {
        return Err(ApiError::MessageTooLong {
            max: MAX_USER_MESSAGE_LENGTH,
            current_length,
        });
    }

    let assistant = &state.assistant;
    let requested = req.conversation_id.filter(|id| !id.is_empty());

    let conversation_id = match requested {
        Some(id) if assistant.load_conversation(&id).await => id,
        other => {
            if let Some(id) = other {
                tracing::info!(conversation_id = %id, "Unknown conversation; starting a new one");
            }
            assistant
                .start_conversation(None)
                .await
                .ok_or_else(|| ApiError::Internal("Failed to create new conversation".to_string()))?
        }
    };

    let response = assistant.process(&req.message).await;

    Ok(Json(ChatResponse {
        status: "success".to_string(),
        conversation_id,
        response,
    }))
}
