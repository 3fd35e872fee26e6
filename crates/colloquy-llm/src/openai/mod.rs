mod adapter;

pub use adapter::{OpenAIAdapter, OPENAI_USAGE_KEYS};
