//! Prelude module for convenient imports
//!
//! Import everything you need with:
//! ```rust
//! use colloquy::prelude::*;
//! ```

pub use crate::{
    Assistant, AssistantBuilder, AssistantConfig, AssistantEvent, AssistantState, EventSink,
    PromptConfig,
    ChatClient, ClientFactory, Message, NormalizedResponse, ProviderConfig, Role, Transport,
    ContextBuilder,
    Conversation, ConversationSummary, MemoryPersistenceClient, PersistenceClient,
};

#[cfg(feature = "sqlite")]
pub use crate::SqlitePersistenceClient;
