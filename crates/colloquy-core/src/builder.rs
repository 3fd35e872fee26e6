use anyhow::Result;
use std::sync::Arc;

use colloquy_llm::{ChatClient, ClientFactory, ProviderConfig, ReqwestTransport, Transport};
use colloquy_persist::PersistenceClient;
use colloquy_types::{AssistantConfig, EventSink, PromptConfig, TracingSink};

use crate::assistant::Assistant;

/// Builder for constructing an [`Assistant`] with optional components.
///
/// Without a provider config or client the assistant still builds, but
/// answers every turn with the not-ready message until
/// [`Assistant::switch_provider`] succeeds.
pub struct AssistantBuilder {
    provider: Option<ProviderConfig>,
    client: Option<Arc<dyn ChatClient>>,
    transport: Option<Arc<dyn Transport>>,
    persistence: Option<Arc<dyn PersistenceClient>>,
    events: Option<Arc<dyn EventSink>>,
    config: AssistantConfig,
    prompt: PromptConfig,
}

impl AssistantBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            client: None,
            transport: None,
            persistence: None,
            events: None,
            config: AssistantConfig::default(),
            prompt: PromptConfig::default(),
        }
    }

    /// Provider to build the LLM client from
    pub fn provider(mut self, config: ProviderConfig) -> Self {
        self.provider = Some(config);
        self
    }

    /// Use a ready-made client; takes precedence over `provider`
    pub fn client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// HTTP transport shared by the initial client and later provider switches
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Enable persistence with a PersistenceClient
    pub fn with_persistence(mut self, client: Arc<dyn PersistenceClient>) -> Self {
        self.persistence = Some(client);
        self
    }

    pub fn events(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn config(mut self, config: AssistantConfig) -> Self {
        self.config = config;
        self
    }

    pub fn prompt(mut self, prompt: PromptConfig) -> Self {
        self.prompt = prompt;
        self
    }

    /// Build the Assistant
    pub fn build(self) -> Result<Assistant> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::builder()
                    .timeout(self.config.response_timeout)
                    .build()?,
            ),
        };

        let client = match (self.client, self.provider) {
            (Some(client), _) => Some(client),
            (None, Some(provider)) => Some(ClientFactory::create_client_with_transport(
                provider,
                Arc::clone(&transport),
            )?),
            (None, None) => {
                tracing::warn!("No LLM provider configured; assistant starts uninitialized");
                None
            }
        };

        let events = self.events.unwrap_or_else(|| Arc::new(TracingSink));

        Ok(Assistant::new(
            client,
            transport,
            self.persistence,
            events,
            self.config,
            self.prompt,
        ))
    }
}

impl Default for AssistantBuilder {
    fn default() -> Self {
        Self::new()
    }
}
