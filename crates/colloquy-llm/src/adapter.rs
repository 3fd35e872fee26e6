use serde_json::{json, Value};
use std::collections::HashMap;

use crate::anthropic::AnthropicAdapter;
use crate::config::{ProviderConfig, ProviderKind};
use crate::generic::GenericAdapter;
use crate::openai::OpenAIAdapter;
use crate::response::NormalizedResponse;
use crate::types::Message;

/// Translation between neutral messages and one vendor's wire format.
///
/// Adapters are stateless; the owning client supplies the config on every
/// call. `parse_response` only sees bodies the transport reported as
/// successful.
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn build_payload(&self, config: &ProviderConfig, messages: &[Message]) -> Value;

    fn parse_response(&self, body: &str) -> NormalizedResponse;

    fn build_headers(&self, config: &ProviderConfig) -> HashMap<String, String>;
}

/// Pick the adapter for a provider kind
pub fn adapter_for(kind: ProviderKind) -> Box<dyn ProviderAdapter> {
    match kind {
        ProviderKind::OpenAI => Box::new(OpenAIAdapter),
        ProviderKind::Anthropic => Box::new(AnthropicAdapter),
        ProviderKind::Generic => Box::new(GenericAdapter),
    }
}

pub(crate) fn wire_message(message: &Message) -> Value {
    json!({
        "role": message.role.as_str(),
        "content": message.content,
    })
}

/// `Content-Type` plus the configured extra headers. Auth headers are
/// inserted afterwards by each adapter so they win on name clashes.
pub(crate) fn base_headers(config: &ProviderConfig) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    for (name, value) in &config.extra_headers {
        headers.insert(name.clone(), value.clone());
    }
    headers
}
