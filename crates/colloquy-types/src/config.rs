use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI voice assistant. You provide clear, concise, and accurate responses. Keep your responses conversational and appropriate for voice interaction.";
pub const DEFAULT_USER_PROMPT_TEMPLATE: &str = "User: {user_input}\n\nContext: {context}\n\nAssistant:";
pub const DEFAULT_CONTEXT_TEMPLATE: &str = "Previous conversation:\n{history}";

/// Orchestrator behaviour knobs.
///
/// `max_conversation_history` bounds both the chat context and the
/// in-memory buffer (which is trimmed once it reaches twice this size).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub auto_persist: bool,
    pub response_timeout: Duration,
    pub max_conversation_history: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            auto_persist: true,
            response_timeout: Duration::from_secs(30),
            max_conversation_history: 20,
        }
    }
}

impl AssistantConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auto_persist(mut self, enabled: bool) -> Self {
        self.auto_persist = enabled;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_max_conversation_history(mut self, max: usize) -> Self {
        self.max_conversation_history = max;
        self
    }
}

/// Prompt text and the template-render limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub system_prompt: String,
    pub user_prompt_template: String,
    pub context_template: String,
    /// Messages included by the template render; independent of
    /// `AssistantConfig::max_conversation_history`
    pub max_history_messages: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            user_prompt_template: DEFAULT_USER_PROMPT_TEMPLATE.to_string(),
            context_template: DEFAULT_CONTEXT_TEMPLATE.to_string(),
            max_history_messages: 10,
        }
    }
}

impl PromptConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_user_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.user_prompt_template = template.into();
        self
    }

    pub fn with_context_template(mut self, template: impl Into<String>) -> Self {
        self.context_template = template.into();
        self
    }

    pub fn with_max_history_messages(mut self, max: usize) -> Self {
        self.max_history_messages = max;
        self
    }
}
