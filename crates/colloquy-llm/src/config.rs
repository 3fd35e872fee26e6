// Configuration layer for provider-agnostic LLM client creation
// This module provides a factory pattern for creating chat clients from configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::client::LlmClient;
use crate::traits::ChatClient;
use crate::transport::{ReqwestTransport, Transport};

pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";

/// Wire format family selected from the `provider` string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    Generic,
}

impl ProviderKind {
    /// Map a provider name to its wire format.
    ///
    /// Only `"openai"` and `"anthropic"` are recognized. Every other name,
    /// including typos, is served by the generic adapter.
    pub fn from_provider(provider: &str) -> Self {
        match provider {
            "openai" => ProviderKind::OpenAI,
            "anthropic" => ProviderKind::Anthropic,
            _ => ProviderKind::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Generic => "generic",
        }
    }
}

/// Reasons a provider configuration is rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("LLM provider cannot be empty")]
    EmptyProvider,

    #[error("API endpoint cannot be empty")]
    EmptyEndpoint,

    #[error("Temperature must be between 0.0 and 2.0, got {0}")]
    TemperatureOutOfRange(f64),

    #[error("Max tokens must be positive")]
    InvalidMaxTokens,
}

/// Complete provider configuration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub provider: String,
    pub api_endpoint: String,
    pub api_key: String,
    pub model_name: String,
    pub temperature: f64,
    pub max_tokens: u32,
    #[serde(alias = "headers")]
    pub extra_headers: HashMap<String, String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_endpoint: DEFAULT_OPENAI_ENDPOINT.to_string(),
            api_key: String::new(),
            model_name: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            extra_headers: HashMap::new(),
        }
    }
}

// Keeps API keys out of logs
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_endpoint", &self.api_endpoint)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("model_name", &self.model_name)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("extra_headers", &self.extra_headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderConfig {
    /// Config for an arbitrary provider name and endpoint
    pub fn new(provider: impl Into<String>, api_endpoint: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            api_endpoint: api_endpoint.into(),
            ..Self::default()
        }
    }

    /// Create OpenAI provider config
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Create Anthropic provider config
    pub fn anthropic(api_key: impl Into<String>) -> Self {
        Self {
            provider: "anthropic".to_string(),
            api_endpoint: DEFAULT_ANTHROPIC_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model_name: DEFAULT_ANTHROPIC_MODEL.to_string(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_name = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    /// Get the provider kind
    pub fn kind(&self) -> ProviderKind {
        ProviderKind::from_provider(&self.provider)
    }

    /// Check the invariants every client relies on.
    ///
    /// An empty API key is accepted with a warning, since local
    /// OpenAI-compatible servers usually do not need one.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.provider.trim().is_empty() {
            return Err(ConfigError::EmptyProvider);
        }
        if self.api_endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::TemperatureOutOfRange(self.temperature));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::InvalidMaxTokens);
        }
        if self.api_key.is_empty() {
            tracing::warn!(
                provider = %self.provider,
                "API key is empty - this may cause authentication issues"
            );
        }
        Ok(())
    }
}

/// Factory for creating chat clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    /// Create a chat client backed by the default reqwest transport
    pub fn create_client(config: ProviderConfig) -> Result<Arc<dyn ChatClient>> {
        let transport = ReqwestTransport::new()?;
        Self::create_client_with_transport(config, Arc::new(transport))
    }

    /// Create a chat client that sends requests through `transport`
    pub fn create_client_with_transport(
        config: ProviderConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Arc<dyn ChatClient>> {
        config.validate()?;
        tracing::info!(
            provider = %config.provider,
            kind = config.kind().as_str(),
            model = %config.model_name,
            "Creating LLM client"
        );
        Ok(Arc::new(LlmClient::new(config, transport)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_mapping() {
        assert_eq!(ProviderKind::from_provider("openai"), ProviderKind::OpenAI);
        assert_eq!(ProviderKind::from_provider("anthropic"), ProviderKind::Anthropic);
        assert_eq!(ProviderKind::from_provider("ollama"), ProviderKind::Generic);
        assert_eq!(ProviderKind::from_provider("OpenAI"), ProviderKind::Generic);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ProviderConfig::default();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.api_endpoint, DEFAULT_OPENAI_ENDPOINT);
        assert_eq!(config.model_name, "gpt-3.5-turbo");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let config = ProviderConfig::new("", "http://localhost");
        assert_eq!(config.validate(), Err(ConfigError::EmptyProvider));

        let config = ProviderConfig::new("openai", "  ");
        assert_eq!(config.validate(), Err(ConfigError::EmptyEndpoint));

        let config = ProviderConfig::openai("k").with_temperature(2.5);
        assert_eq!(config.validate(), Err(ConfigError::TemperatureOutOfRange(2.5)));

        let config = ProviderConfig::openai("k").with_temperature(f64::NAN);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TemperatureOutOfRange(_))
        ));

        let config = ProviderConfig::openai("k").with_max_tokens(0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidMaxTokens));
    }

    #[test]
    fn test_temperature_bounds_are_inclusive() {
        assert!(ProviderConfig::openai("k").with_temperature(0.0).validate().is_ok());
        assert!(ProviderConfig::openai("k").with_temperature(2.0).validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ProviderConfig::openai("sk-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_serde_accepts_headers_alias() {
        let json = r#"{
            "provider": "custom",
            "api_endpoint": "http://localhost:11434/api/chat",
            "headers": {"X-Org": "acme"}
        }"#;
        let config: ProviderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.kind(), ProviderKind::Generic);
        assert_eq!(config.extra_headers.get("X-Org").map(String::as_str), Some("acme"));
        assert_eq!(config.max_tokens, 1000);
    }
}
