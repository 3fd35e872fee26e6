use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub assistant_available: bool,
    /// idle, processing or error
    pub state: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub total_conversations: u64,
    pub total_messages: u64,
    pub uptime_secs: u64,
}

/// Server and assistant status
#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "Current status", body = StatusResponse)
    ),
    tag = "status"
)]
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let assistant = &state.assistant;
    let provider = assistant.provider_config().await;

    Json(StatusResponse {
        status: "running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        assistant_available: provider.is_some(),
        state: assistant.state().to_string(),
        provider: provider.as_ref().map(|p| p.provider.clone()),
        model: provider.map(|p| p.model_name),
        total_conversations: assistant.total_conversations().await,
        total_messages: assistant.total_messages().await,
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is up")
    ),
    tag = "status"
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
