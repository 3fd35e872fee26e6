// Anthropic messages API wire format

use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::adapter::{base_headers, wire_message, ProviderAdapter};
use crate::config::{ProviderConfig, ProviderKind};
use crate::response::{
    api_error, parse_json, usage_metadata, CompletionErrorKind, NormalizedResponse,
};
use crate::types::{Message, Role};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const ANTHROPIC_USAGE_KEYS: &[&str] = &["input_tokens", "output_tokens"];

#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicAdapter;

impl AnthropicAdapter {
    /// Text of `content[0].text`, if present
    pub(crate) fn first_block(value: &Value) -> Option<&str> {
        value.get("content")?.get(0)?.get("text")?.as_str()
    }
}

impl ProviderAdapter for AnthropicAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    /// System messages move to the top-level `system` field. When several
    /// are present the last one is sent.
    fn build_payload(&self, config: &ProviderConfig, messages: &[Message]) -> Value {
        let mut system: Option<&str> = None;
        let mut turns = Vec::with_capacity(messages.len());

        for message in messages {
            if message.role == Role::System {
                system = Some(&message.content);
            } else {
                turns.push(wire_message(message));
            }
        }

        let mut payload = Map::new();
        payload.insert("model".to_string(), json!(config.model_name));
        payload.insert("max_tokens".to_string(), json!(config.max_tokens));
        if let Some(system) = system {
            payload.insert("system".to_string(), json!(system));
        }
        payload.insert("messages".to_string(), Value::Array(turns));

        Value::Object(payload)
    }

    fn parse_response(&self, body: &str) -> NormalizedResponse {
        let value = match parse_json(body) {
            Ok(value) => value,
            Err(failure) => return failure,
        };

        if let Some(message) = api_error(&value) {
            return NormalizedResponse::failure(CompletionErrorKind::Api, message);
        }

        match Self::first_block(&value) {
            Some(text) => NormalizedResponse::success(text)
                .with_metadata(usage_metadata(&value, ANTHROPIC_USAGE_KEYS)),
            None => NormalizedResponse::failure(
                CompletionErrorKind::NoCompletion,
                "No content in response",
            ),
        }
    }

    fn build_headers(&self, config: &ProviderConfig) -> HashMap<String, String> {
        let mut headers = base_headers(config);
        headers.insert("x-api-key".to_string(), config.api_key.clone());
        headers.insert("anthropic-version".to_string(), ANTHROPIC_VERSION.to_string());
        headers
    }
}
