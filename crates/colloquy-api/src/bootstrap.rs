use anyhow::{Context, Result};
use std::sync::Arc;

use colloquy_core::Assistant;
use colloquy_persist::{MemoryPersistenceClient, PersistenceClient, SqlitePersistenceClient};
use colloquy_types::TracingSink;

use crate::config::Config;

/// Where conversations are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Sqlite,
    Memory,
}

/// Wire an assistant from configuration.
///
/// An unusable provider config is logged and leaves the assistant
/// uninitialized; a database that cannot be opened is an error.
pub fn build_assistant(config: &Config, storage: Storage) -> Result<Assistant> {
    let persistence: Arc<dyn PersistenceClient> = match storage {
        Storage::Sqlite => Arc::new(
            SqlitePersistenceClient::open(&config.database.path)
                .with_context(|| format!("Failed to open database {}", config.database.path))?,
        ),
        Storage::Memory => {
            tracing::info!("Using in-memory conversation storage");
            Arc::new(MemoryPersistenceClient::new())
        }
    };

    let mut builder = Assistant::builder()
        .with_persistence(persistence)
        .events(Arc::new(TracingSink))
        .config(config.assistant_config())
        .prompt(config.prompt.clone());

    let provider = config.provider_config();
    match provider.validate() {
        Ok(()) => {
            tracing::info!(
                provider = %provider.provider,
                model = %provider.model_name,
                "Initializing LLM client"
            );
            builder = builder.provider(provider);
        }
        Err(e) => {
            tracing::error!(error = %e, "Invalid LLM configuration; assistant not initialized");
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_assistant_from_defaults() {
        let mut config = Config::default();
        config.api_key = "sk-test".to_string();

        let assistant = build_assistant(&config, Storage::Memory).unwrap();
        assert!(assistant.is_ready().await);
        assert_eq!(assistant.provider_config().await.unwrap().provider, "openai");
    }

    #[tokio::test]
    async fn test_invalid_provider_leaves_assistant_uninitialized() {
        let mut config = Config::default();
        config.llm.provider = "local".to_string();

        // Generic providers have no default endpoint
        let assistant = build_assistant(&config, Storage::Memory).unwrap();
        assert!(!assistant.is_ready().await);
    }

    #[tokio::test]
    async fn test_sqlite_storage_opens_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.path = dir.path().join("db").join("chat.db").display().to_string();

        let assistant = build_assistant(&config, Storage::Sqlite).unwrap();
        assert!(assistant.system_info().await.contains("sqlite:"));
    }
}
