use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use colloquy_persist::ConversationSummary;
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

const DEFAULT_LIST_LIMIT: usize = 10;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListParams {
    /// Maximum number of conversations (default 10)
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationItem {
    pub id: String,
    pub title: String,
    /// Unix seconds
    pub created_at: i64,
    /// Unix seconds
    pub updated_at: i64,
    pub message_count: u64,
}

impl From<ConversationSummary> for ConversationItem {
    fn from(summary: ConversationSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            created_at: summary.created_at.timestamp(),
            updated_at: summary.updated_at.timestamp(),
            message_count: summary.message_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationList {
    pub conversations: Vec<ConversationItem>,
}

/// List conversations, most recently active first
#[utoipa::path(
    get,
    path = "/api/conversations",
    params(ListParams),
    responses(
        (status = 200, description = "Recent conversations", body = ConversationList)
    ),
    tag = "conversations"
)]
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Json<ConversationList> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let conversations = state
        .assistant
        .recent_conversations(limit)
        .await
        .into_iter()
        .map(ConversationItem::from)
        .collect();

    Json(ConversationList { conversations })
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MessagesParams {
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageItem {
    pub id: i64,
    pub role: String,
    pub content: String,
    /// Unix seconds
    pub timestamp: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationMessages {
    pub conversation_id: String,
    pub title: String,
    pub messages: Vec<MessageItem>,
}

/// Read a stored conversation without making it current
#[utoipa::path(
    get,
    path = "/api/conversations/messages",
    params(MessagesParams),
    responses(
        (status = 200, description = "Conversation messages", body = ConversationMessages),
        (status = 400, description = "conversation_id missing"),
        (status = 404, description = "Conversation not found")
    ),
    tag = "conversations"
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MessagesParams>,
) -> ApiResult<Json<ConversationMessages>> {
    let conversation_id = params
        .conversation_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("conversation_id parameter is required".to_string()))?;

    let conversation = state
        .assistant
        .conversation(&conversation_id)
        .await
        .ok_or_else(|| ApiError::ConversationNotFound(conversation_id.clone()))?;

    let messages = conversation
        .messages
        .into_iter()
        .map(|m| MessageItem {
            id: m.id,
            role: m.role.to_string(),
            content: m.content,
            timestamp: m.timestamp.timestamp(),
        })
        .collect();

    Ok(Json(ConversationMessages {
        conversation_id,
        title: conversation.title,
        messages,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteRequest {
    pub conversation_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Delete a conversation and its messages
#[utoipa::path(
    delete,
    path = "/api/conversations",
    request_body = DeleteRequest,
    responses(
        (status = 200, description = "Conversation deleted", body = DeleteResponse),
        (status = 404, description = "Conversation not found")
    ),
    tag = "conversations"
)]
pub async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteRequest>,
) -> ApiResult<Json<DeleteResponse>> {
    if !state.assistant.delete_conversation(&req.conversation_id).await {
        return Err(ApiError::ConversationNotFound(req.conversation_id));
    }

    Ok(Json(DeleteResponse {
        success: true,
        message: "Conversation deleted successfully".to_string(),
    }))
}
