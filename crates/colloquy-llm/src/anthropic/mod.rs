mod adapter;

pub use adapter::{AnthropicAdapter, ANTHROPIC_USAGE_KEYS, ANTHROPIC_VERSION};
