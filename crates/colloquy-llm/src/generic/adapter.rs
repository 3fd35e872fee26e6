// Best-effort adapter for self-hosted and OpenAI-compatible servers

use serde_json::Value;
use std::collections::HashMap;

use crate::adapter::{base_headers, ProviderAdapter};
use crate::anthropic::ANTHROPIC_USAGE_KEYS;
use crate::config::{ProviderConfig, ProviderKind};
use crate::openai::{OpenAIAdapter, OPENAI_USAGE_KEYS};
use crate::response::{
    api_error, parse_json, usage_metadata, CompletionErrorKind, NormalizedResponse,
};
use crate::types::Message;

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericAdapter;

impl GenericAdapter {
    fn from_choices(value: &Value) -> Option<String> {
        let first = value.get("choices")?.as_array()?.first()?;
        first
            .get("message")
            .and_then(|m| m.get("content"))
            .or_else(|| first.get("text"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn from_content(value: &Value) -> Option<String> {
        match value.get("content")? {
            Value::String(text) => Some(text.clone()),
            Value::Array(blocks) => blocks
                .first()?
                .get("text")?
                .as_str()
                .map(str::to_string),
            _ => None,
        }
    }

    fn from_response_field(value: &Value) -> Option<String> {
        value.get("response")?.as_str().map(str::to_string)
    }
}

impl ProviderAdapter for GenericAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Generic
    }

    fn build_payload(&self, config: &ProviderConfig, messages: &[Message]) -> Value {
        OpenAIAdapter.build_payload(config, messages)
    }

    /// Shapes are tried in order: `choices`, `content`, `response`.
    fn parse_response(&self, body: &str) -> NormalizedResponse {
        let value = match parse_json(body) {
            Ok(value) => value,
            Err(failure) => return failure,
        };

        if let Some(message) = api_error(&value) {
            return NormalizedResponse::failure(CompletionErrorKind::Api, message);
        }

        let content = Self::from_choices(&value)
            .or_else(|| Self::from_content(&value))
            .or_else(|| Self::from_response_field(&value));

        match content {
            Some(content) => {
                let mut metadata = usage_metadata(&value, OPENAI_USAGE_KEYS);
                metadata.extend(usage_metadata(&value, ANTHROPIC_USAGE_KEYS));
                NormalizedResponse::success(content).with_metadata(metadata)
            }
            None => NormalizedResponse::failure(
                CompletionErrorKind::Parse,
                "Unknown response format",
            ),
        }
    }

    fn build_headers(&self, config: &ProviderConfig) -> HashMap<String, String> {
        let mut headers = base_headers(config);
        if !config.api_key.is_empty() {
            headers.insert(
                "Authorization".to_string(),
                format!("Bearer {}", config.api_key),
            );
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> NormalizedResponse {
        GenericAdapter.parse_response(body)
    }

    #[test]
    fn test_openai_shape() {
        let response = parse(r#"{"choices":[{"message":{"content":"a"}}]}"#);
        assert!(response.success);
        assert_eq!(response.content, "a");
    }

    #[test]
    fn test_legacy_completion_text() {
        let response = parse(r#"{"choices":[{"text":"legacy"}]}"#);
        assert_eq!(response.content, "legacy");
    }

    #[test]
    fn test_anthropic_shapes() {
        assert_eq!(parse(r#"{"content":[{"text":"b"}]}"#).content, "b");
        assert_eq!(parse(r#"{"content":"c"}"#).content, "c");
    }

    #[test]
    fn test_bare_response_field() {
        let response = parse(r#"{"model":"llama3","response":"d","done":true}"#);
        assert!(response.success);
        assert_eq!(response.content, "d");
    }

    #[test]
    fn test_choices_preferred_over_response_field() {
        let response = parse(r#"{"choices":[{"message":{"content":"first"}}],"response":"second"}"#);
        assert_eq!(response.content, "first");
    }

    #[test]
    fn test_empty_choices_falls_through() {
        let response = parse(r#"{"choices":[],"response":"fallback"}"#);
        assert_eq!(response.content, "fallback");
    }

    #[test]
    fn test_unknown_format() {
        let response = parse(r#"{"output":"x"}"#);
        assert!(!response.success);
        assert_eq!(response.error_kind, Some(CompletionErrorKind::Parse));
        assert_eq!(response.error_message, "Unknown response format");
    }

    #[test]
    fn test_error_string() {
        let response = parse(r#"{"error":"model not found"}"#);
        assert_eq!(response.error_kind, Some(CompletionErrorKind::Api));
        assert_eq!(response.error_message, "model not found");
    }

    #[test]
    fn test_auth_only_with_key() {
        let anonymous = ProviderConfig::new("ollama", "http://localhost:11434/api/chat");
        assert!(!GenericAdapter.build_headers(&anonymous).contains_key("Authorization"));

        let keyed = anonymous.with_api_key("t0k");
        assert_eq!(GenericAdapter.build_headers(&keyed)["Authorization"], "Bearer t0k");
    }
}
