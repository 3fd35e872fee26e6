// OpenAI chat completions wire format

use serde_json::{json, Value};
use std::collections::HashMap;

use crate::adapter::{base_headers, wire_message, ProviderAdapter};
use crate::config::{ProviderConfig, ProviderKind};
use crate::response::{
    api_error, parse_json, usage_metadata, CompletionErrorKind, NormalizedResponse,
};
use crate::types::Message;

pub const OPENAI_USAGE_KEYS: &[&str] = &["prompt_tokens", "completion_tokens", "total_tokens"];

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAIAdapter;

impl OpenAIAdapter {
    /// Text of `choices[0].message.content`, if present
    pub(crate) fn first_choice(value: &Value) -> Option<&str> {
        value
            .get("choices")?
            .get(0)?
            .get("message")?
            .get("content")?
            .as_str()
    }
}

impl ProviderAdapter for OpenAIAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    fn build_payload(&self, config: &ProviderConfig, messages: &[Message]) -> Value {
        // System messages stay inline
        let messages: Vec<Value> = messages.iter().map(wire_message).collect();

        json!({
            "model": config.model_name,
            "temperature": config.temperature,
            "max_tokens": config.max_tokens,
            "messages": messages,
        })
    }

    fn parse_response(&self, body: &str) -> NormalizedResponse {
        let value = match parse_json(body) {
            Ok(value) => value,
            Err(failure) => return failure,
        };

        // An error object wins even next to a plausible choices array
        if let Some(message) = api_error(&value) {
            return NormalizedResponse::failure(CompletionErrorKind::Api, message);
        }

        match Self::first_choice(&value) {
            Some(content) => NormalizedResponse::success(content)
                .with_metadata(usage_metadata(&value, OPENAI_USAGE_KEYS)),
            None => NormalizedResponse::failure(
                CompletionErrorKind::NoCompletion,
                "No choices in response",
            ),
        }
    }

    fn build_headers(&self, config: &ProviderConfig) -> HashMap<String, String> {
        let mut headers = base_headers(config);
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", config.api_key),
        );
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_keeps_system_inline() {
        let config = ProviderConfig::openai("k").with_model("gpt-4o-mini").with_max_tokens(64);
        let messages = vec![Message::system("be brief"), Message::user("hi")];

        let payload = OpenAIAdapter.build_payload(&config, &messages);

        assert_eq!(payload["model"], "gpt-4o-mini");
        assert_eq!(payload["max_tokens"], 64);
        assert_eq!(payload["temperature"], 0.7);
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["content"], "hi");
        assert_eq!(payload["messages"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_parse_success_with_usage() {
        let body = r#"{"choices":[{"message":{"content":"hi"}}],"usage":{"prompt_tokens":3,"completion_tokens":1,"total_tokens":4}}"#;

        let response = OpenAIAdapter.parse_response(body);

        assert!(response.success);
        assert_eq!(response.content, "hi");
        assert_eq!(response.error_kind, None);
        let expected: HashMap<String, String> = [
            ("prompt_tokens", "3"),
            ("completion_tokens", "1"),
            ("total_tokens", "4"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(response.metadata, expected);
    }

    #[test]
    fn test_error_takes_precedence_over_choices() {
        let body = r#"{"choices":[{"message":{"content":"hi"}}],"error":{"message":"quota exceeded"}}"#;

        let response = OpenAIAdapter.parse_response(body);

        assert!(!response.success);
        assert_eq!(response.error_kind, Some(CompletionErrorKind::Api));
        assert_eq!(response.error_message, "quota exceeded");
    }

    #[test]
    fn test_empty_choices_is_no_completion() {
        let response = OpenAIAdapter.parse_response(r#"{"choices":[]}"#);
        assert_eq!(response.error_kind, Some(CompletionErrorKind::NoCompletion));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let response = OpenAIAdapter.parse_response("{\"choices\": [");
        assert_eq!(response.error_kind, Some(CompletionErrorKind::Parse));
    }

    #[test]
    fn test_auth_header_overrides_extra_headers() {
        let config = ProviderConfig::openai("sk-1")
            .with_header("Authorization", "Bearer stale")
            .with_header("OpenAI-Organization", "org-1");

        let headers = OpenAIAdapter.build_headers(&config);

        assert_eq!(headers["Authorization"], "Bearer sk-1");
        assert_eq!(headers["OpenAI-Organization"], "org-1");
        assert_eq!(headers["Content-Type"], "application/json");
    }
}
