pub mod config;
pub mod events;
pub mod state;

pub use config::{
    AssistantConfig, PromptConfig, DEFAULT_CONTEXT_TEMPLATE, DEFAULT_SYSTEM_PROMPT,
    DEFAULT_USER_PROMPT_TEMPLATE,
};
pub use events::{AssistantEvent, EventSink, NoopSink, TracingSink};
pub use state::AssistantState;

// Re-export the message model shared by every crate
pub use colloquy_llm::{Message, Role};
