use std::sync::Arc;

use colloquy_api::{build_assistant, config::Config, init_logging, serve, AppState, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load(None)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    init_logging(&config.logging)?;

    tracing::info!("Starting Colloquy API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    let assistant = build_assistant(&config, Storage::Sqlite)?;

    // Create application state
    let state = Arc::new(AppState::new(config, Arc::new(assistant)));

    serve(state).await
}
