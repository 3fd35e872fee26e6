use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Message too long. Maximum length is {max} characters.")]
    MessageTooLong { max: usize, current_length: usize },

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Assistant not available")]
    AssistantUnavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::MessageTooLong { .. } => StatusCode::BAD_REQUEST,
            ApiError::ConversationNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AssistantUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::MessageTooLong { .. } => "message_too_long",
            ApiError::ConversationNotFound(_) => "not_found",
            ApiError::AssistantUnavailable => "unavailable",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let mut body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        if let ApiError::MessageTooLong { current_length, .. } = &self {
            body["current_length"] = json!(current_length);
        }

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(format!("{:#}", err))
    }
}
