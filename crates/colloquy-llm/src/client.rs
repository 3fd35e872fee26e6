// Provider client: adapter + transport bound to one immutable config

use async_trait::async_trait;
use std::sync::Arc;

use crate::adapter::{adapter_for, ProviderAdapter};
use crate::config::ProviderConfig;
use crate::response::{CompletionErrorKind, NormalizedResponse};
use crate::traits::ChatClient;
use crate::transport::Transport;
use crate::types::Message;

pub struct LlmClient {
    config: ProviderConfig,
    adapter: Box<dyn ProviderAdapter>,
    transport: Arc<dyn Transport>,
}

impl LlmClient {
    /// Bind a config to the adapter its provider name selects.
    ///
    /// The config is not validated here; use `ClientFactory` for that.
    pub fn new(config: ProviderConfig, transport: Arc<dyn Transport>) -> Self {
        let adapter = adapter_for(config.kind());
        Self {
            config,
            adapter,
            transport,
        }
    }

    pub fn adapter(&self) -> &dyn ProviderAdapter {
        self.adapter.as_ref()
    }
}

#[async_trait]
impl ChatClient for LlmClient {
    async fn complete(&self, messages: &[Message]) -> NormalizedResponse {
        let payload = self.adapter.build_payload(&self.config, messages).to_string();
        let headers = self.adapter.build_headers(&self.config);

        tracing::debug!(
            provider = %self.config.provider,
            endpoint = %self.config.api_endpoint,
            messages = messages.len(),
            "Sending completion request"
        );

        let http = self
            .transport
            .post(&self.config.api_endpoint, &payload, &headers)
            .await;

        if !http.success {
            tracing::warn!(
                provider = %self.config.provider,
                status = http.status_code,
                error = %http.error_message,
                "Completion request failed"
            );
            // Providers usually explain non-2xx replies in the body
            let detail = crate::response::parse_json(&http.body)
                .ok()
                .and_then(|value| crate::response::api_error(&value));
            let message = match detail {
                Some(detail) => format!("{}: {}", http.error_message, detail),
                None => http.error_message,
            };
            return NormalizedResponse::failure(CompletionErrorKind::Transport, message)
                .with_http_status(http.status_code);
        }

        let response = self
            .adapter
            .parse_response(&http.body)
            .with_http_status(http.status_code);

        if response.success {
            tracing::debug!(
                provider = %self.config.provider,
                chars = response.content.chars().count(),
                "Completion received"
            );
        } else {
            tracing::warn!(
                provider = %self.config.provider,
                kind = ?response.error_kind,
                error = %response.error_message,
                "Provider returned an unusable response"
            );
        }

        response
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}
