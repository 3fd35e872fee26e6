pub mod assistant;
pub mod builder;
pub mod title;

pub use assistant::{Assistant, INTERNAL_APOLOGY, NOT_READY_MESSAGE, PROVIDER_APOLOGY};
pub use builder::AssistantBuilder;
pub use title::derive_title;

// Re-export the types callers need to drive an assistant
pub use colloquy_types::{
    AssistantConfig, AssistantEvent, AssistantState, EventSink, NoopSink, PromptConfig,
    TracingSink,
};
