use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use colloquy_llm::{ProviderConfig, ProviderKind};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Provider switch request; omitted fields take the provider's defaults
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProviderRequest {
    pub provider: String,
    #[serde(default)]
    pub api_endpoint: Option<String>,
    /// Falls back to the key the server was started with
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl ProviderRequest {
    fn into_config(self, default_key: &str) -> ProviderConfig {
        let api_key = self.api_key.unwrap_or_else(|| default_key.to_string());

        let mut config = match ProviderKind::from_provider(&self.provider) {
            ProviderKind::OpenAI => ProviderConfig::openai(api_key),
            ProviderKind::Anthropic => ProviderConfig::anthropic(api_key),
            ProviderKind::Generic => {
                ProviderConfig::new(self.provider.clone(), String::new()).with_api_key(api_key)
            }
        };

        if let Some(endpoint) = self.api_endpoint {
            config.api_endpoint = endpoint;
        }
        if let Some(model) = self.model {
            config = config.with_model(model);
        }
        if let Some(temperature) = self.temperature {
            config = config.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        for (name, value) in self.headers {
            config = config.with_header(name, value);
        }
        config
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProviderResponse {
    pub success: bool,
    pub provider: String,
    pub model: String,
}

/// Replace the LLM provider; the previous one stays active on failure
#[utoipa::path(
    put,
    path = "/api/provider",
    request_body = ProviderRequest,
    responses(
        (status = 200, description = "Provider switched", body = ProviderResponse),
        (status = 400, description = "Invalid provider configuration")
    ),
    tag = "provider"
)]
pub async fn switch_provider(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProviderRequest>,
) -> ApiResult<Json<ProviderResponse>> {
    let config = req.into_config(&state.config.api_key);
    let provider = config.provider.clone();
    let model = config.model_name.clone();

    if !state.assistant.switch_provider(config).await {
        return Err(ApiError::BadRequest(format!(
            "Failed to switch to provider '{}'",
            provider
        )));
    }

    Ok(Json(ProviderResponse {
        success: true,
        provider,
        model,
    }))
}
