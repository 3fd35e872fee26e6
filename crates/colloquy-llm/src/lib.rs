pub mod types;
pub mod traits;
pub mod config;
pub mod transport;
pub mod response;
pub mod adapter;
pub mod client;
pub mod openai;
pub mod anthropic;
pub mod generic;

pub use traits::{ChatClient, ResponseCallback};
pub use config::{ClientFactory, ConfigError, ProviderConfig, ProviderKind};
pub use transport::{HttpResponse, ReqwestTransport, ReqwestTransportBuilder, Transport};
pub use response::{CompletionErrorKind, NormalizedResponse};
pub use adapter::{adapter_for, ProviderAdapter};
pub use client::LlmClient;
pub use openai::OpenAIAdapter;
pub use anthropic::AnthropicAdapter;
pub use generic::GenericAdapter;
pub use types::{Message, Role};
