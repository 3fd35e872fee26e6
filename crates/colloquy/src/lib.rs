//! # Colloquy
//!
//! Chat assistant library: pluggable LLM providers, a rolling conversation
//! context and durable conversation history.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use colloquy::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let assistant = Assistant::builder()
//!         .provider(ProviderConfig::openai(std::env::var("OPENAI_API_KEY")?))
//!         .with_persistence(Arc::new(MemoryPersistenceClient::new()))
//!         .build()?;
//!
//!     let reply = assistant.process("What is the capital of Portugal?").await;
//!     println!("{}", reply);
//!
//!     // The next turn sees the previous exchange as context
//!     let reply = assistant.process("And its population?").await;
//!     println!("{}", reply);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`colloquy-llm`**: messages, HTTP transport and the OpenAI, Anthropic
//!   and generic provider adapters
//! - **`colloquy-context`**: context assembly and prompt templates
//! - **`colloquy-persist`**: conversation storage (in-memory, SQLite)
//! - **`colloquy-core`**: the conversation orchestrator
//!
//! ## License
//!
//! MIT

pub mod prelude;

pub use colloquy_core::{
    derive_title, Assistant, AssistantBuilder, INTERNAL_APOLOGY, NOT_READY_MESSAGE,
    PROVIDER_APOLOGY,
};

pub use colloquy_types::{
    AssistantConfig, AssistantEvent, AssistantState, EventSink, NoopSink, PromptConfig,
    TracingSink,
};

pub use colloquy_llm::{
    adapter_for, AnthropicAdapter, ChatClient, ClientFactory, CompletionErrorKind, ConfigError,
    GenericAdapter, HttpResponse, LlmClient, Message, NormalizedResponse, OpenAIAdapter,
    ProviderAdapter, ProviderConfig, ProviderKind, ReqwestTransport, Role, Transport,
};

pub use colloquy_context::{available_presets, expand_template, prompt_preset, ContextBuilder};

pub use colloquy_persist::{
    Conversation, ConversationSummary, MemoryPersistenceClient, PersistError, PersistenceClient,
};

#[cfg(feature = "sqlite")]
pub use colloquy_persist::SqlitePersistenceClient;

// Needed to implement ChatClient, Transport or PersistenceClient
pub use async_trait::async_trait;
