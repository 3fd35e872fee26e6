use config::{Config as ConfigLoader, ConfigBuilder, ConfigError, File};
use config::builder::DefaultState;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use colloquy_llm::config::{
    DEFAULT_ANTHROPIC_ENDPOINT, DEFAULT_ANTHROPIC_MODEL, DEFAULT_MODEL, DEFAULT_OPENAI_ENDPOINT,
};
use colloquy_llm::{ProviderConfig, ProviderKind};
use colloquy_types::{AssistantConfig, PromptConfig};

/// Environment variables that override file settings, and the key each sets
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("SERVER_STATIC_DIR", "server.static_dir"),
    ("SERVER_REQUEST_TIMEOUT_SECS", "server.request_timeout_secs"),
    ("LLM_PROVIDER", "llm.provider"),
    ("LLM_API_ENDPOINT", "llm.api_endpoint"),
    ("LLM_MODEL", "llm.model"),
    ("LLM_TEMPERATURE", "llm.temperature"),
    ("LLM_MAX_TOKENS", "llm.max_tokens"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
    ("LOG_FILE", "logging.file"),
    ("DATABASE_PATH", "database.path"),
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub assistant: AssistantSettings,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(skip)]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served for any path no route matches
    pub static_dir: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: "web".to_string(),
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    /// Empty means the provider's well-known endpoint
    pub api_endpoint: String,
    /// Empty means the provider's default model
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub headers: HashMap<String, String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_endpoint: String::new(),
            model: String::new(),
            temperature: 0.7,
            max_tokens: 1000,
            headers: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssistantSettings {
    pub auto_persist: bool,
    pub response_timeout_secs: u64,
    pub max_conversation_history: usize,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            auto_persist: true,
            response_timeout_secs: 30,
            max_conversation_history: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/colloquy.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `json` or `pretty`
    pub format: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. `explicit`, when given (must exist)
    /// 4. Environment variables (SERVER_, LLM_, LOG_, DATABASE_ prefixes)
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(explicit, |name| std::env::var(name).ok())
    }

    /// [`load`](Self::load) with a custom environment lookup
    pub fn load_with_env<F>(explicit: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = env("ENV").unwrap_or_else(|| "dev".to_string());

        let mut builder = ConfigLoader::builder()
            // 1. Load default config
            .add_source(File::with_name("config/default").required(false))
            // 2. Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", profile)).required(false));

        // 3. Explicit file from the command line
        if let Some(path) = explicit {
            builder = builder.add_source(File::from(PathBuf::from(path)).required(true));
        }

        // 4. Environment variables override everything
        let builder = apply_env_overrides(builder, &env)?;

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        cfg.api_key = resolve_api_key(&cfg.llm.provider, &env);
        if cfg.api_key.is_empty() {
            tracing::warn!(
                provider = %cfg.llm.provider,
                "No API key found in LLM_API_KEY or the provider's key variable"
            );
        }

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Provider settings with endpoint and model filled in per provider
    pub fn provider_config(&self) -> ProviderConfig {
        let kind = ProviderKind::from_provider(&self.llm.provider);

        let endpoint = match (self.llm.api_endpoint.is_empty(), kind) {
            (false, _) => self.llm.api_endpoint.clone(),
            (true, ProviderKind::OpenAI) => DEFAULT_OPENAI_ENDPOINT.to_string(),
            (true, ProviderKind::Anthropic) => DEFAULT_ANTHROPIC_ENDPOINT.to_string(),
            (true, ProviderKind::Generic) => String::new(),
        };
        let model = match (self.llm.model.is_empty(), kind) {
            (false, _) => self.llm.model.clone(),
            (true, ProviderKind::Anthropic) => DEFAULT_ANTHROPIC_MODEL.to_string(),
            (true, _) => DEFAULT_MODEL.to_string(),
        };

        let mut provider = ProviderConfig::new(self.llm.provider.clone(), endpoint)
            .with_api_key(self.api_key.clone())
            .with_model(model)
            .with_temperature(self.llm.temperature)
            .with_max_tokens(self.llm.max_tokens);
        for (name, value) in &self.llm.headers {
            provider = provider.with_header(name.clone(), value.clone());
        }
        provider
    }

    pub fn assistant_config(&self) -> AssistantConfig {
        AssistantConfig::new()
            .with_auto_persist(self.assistant.auto_persist)
            .with_response_timeout(Duration::from_secs(self.assistant.response_timeout_secs))
            .with_max_conversation_history(self.assistant.max_conversation_history)
    }
}

fn apply_env_overrides<F>(
    mut builder: ConfigBuilder<DefaultState>,
    env: &F,
) -> Result<ConfigBuilder<DefaultState>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for (var, key) in ENV_OVERRIDES {
        builder = builder.set_override_option(*key, env(var))?;
    }
    Ok(builder)
}

/// `LLM_API_KEY` first, then the variable the provider's own tooling uses
fn resolve_api_key<F>(provider: &str, env: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let fallback = match ProviderKind::from_provider(provider) {
        ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
        ProviderKind::OpenAI => Some("OPENAI_API_KEY"),
        ProviderKind::Generic => None,
    };

    env("LLM_API_KEY")
        .filter(|key| !key.is_empty())
        .or_else(|| fallback.and_then(|name| env(name)))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 3000

            [cors]
            enabled = true
            origins = ["http://localhost:3000"]

            [llm]
            provider = "anthropic"
            temperature = 0.5
            max_tokens = 800

            [assistant]
            max_conversation_history = 6

            [prompt]
            system_prompt = "Be terse."

            [database]
            path = "/tmp/test.db"

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.static_dir, "web");
        assert_eq!(config.assistant.max_conversation_history, 6);
        assert!(config.assistant.auto_persist);
        assert_eq!(config.prompt.system_prompt, "Be terse.");
        assert_eq!(config.prompt.max_history_messages, 10);

        let provider = config.provider_config();
        assert_eq!(provider.api_endpoint, DEFAULT_ANTHROPIC_ENDPOINT);
        assert_eq!(provider.model_name, DEFAULT_ANTHROPIC_MODEL);
        assert_eq!(provider.max_tokens, 800);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.format, "pretty");

        let provider = config.provider_config();
        assert_eq!(provider.provider, "openai");
        assert_eq!(provider.api_endpoint, DEFAULT_OPENAI_ENDPOINT);
        assert_eq!(provider.model_name, DEFAULT_MODEL);
    }

    #[test]
    fn test_env_overrides_and_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colloquy.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9000\n[llm]\nprovider = \"anthropic\"\nmodel = \"from-file\"\n",
        )
        .unwrap();

        let env: HashMap<&str, &str> = [
            ("SERVER_PORT", "9100"),
            ("LLM_MODEL", "from-env"),
            ("LOG_FORMAT", "json"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
        ]
        .into_iter()
        .collect();

        let config =
            Config::load_with_env(Some(&path), |name| env.get(name).map(|v| v.to_string())).unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.llm.model, "from-env");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.api_key, "sk-ant");
    }

    #[test]
    fn test_generic_provider_reads_only_llm_key() {
        let env = |name: &str| match name {
            "OPENAI_API_KEY" => Some("sk-openai".to_string()),
            _ => None,
        };
        assert_eq!(resolve_api_key("local", &env), "");
        assert_eq!(resolve_api_key("openai", &env), "sk-openai");

        let env = |name: &str| (name == "LLM_API_KEY").then(|| "sk-llm".to_string());
        assert_eq!(resolve_api_key("local", &env), "sk-llm");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = Config::load_with_env(Some(Path::new("/nonexistent/colloquy.toml")), |_| None);
        assert!(result.is_err());
    }
}
