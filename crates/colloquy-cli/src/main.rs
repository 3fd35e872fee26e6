use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use colloquy_api::{build_assistant, init_logging, serve, AppState, Config, Storage};

mod console;
mod interactive;

use console::Console;

/// Chat assistant with pluggable LLM providers
#[derive(Debug, Parser)]
#[command(name = "colloquy", version, about)]
struct Args {
    /// Configuration file layered over config/default.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level or filter (overrides the configuration)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<String>,

    /// Test connections and exit
    #[arg(long)]
    test: bool,

    /// Choose provider and prompt preset before starting
    #[arg(long)]
    interactive: bool,

    /// Serve the HTTP API and web interface instead of the console
    #[arg(long)]
    web: bool,

    /// Web server port
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Web server bind address (defaults to the configured host)
    #[arg(long)]
    host: Option<String>,

    /// Keep conversations in memory instead of SQLite
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load .env file
    dotenvy::dotenv().ok();

    let mut config = Config::load(args.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.to_lowercase();
    }
    if args.log_file.is_some() {
        config.logging.file = args.log_file.clone();
    }
    config.server.port = args.port;
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }

    init_logging(&config.logging)?;
    tracing::info!("Starting Colloquy v{}", env!("CARGO_PKG_VERSION"));

    let storage = if args.memory { Storage::Memory } else { Storage::Sqlite };
    let assistant = Arc::new(build_assistant(&config, storage)?);

    if args.test {
        println!("Testing connections...");
        if assistant.test_connections().await {
            println!("All connections successful!");
            return Ok(());
        }
        println!("Some connections failed. Check configuration.");
        std::process::exit(1);
    }

    if args.interactive {
        interactive::configure(&assistant, io::stdin().lock(), io::stdout()).await?;
    }

    if let Some(id) = assistant.start_conversation(None).await {
        tracing::info!(conversation_id = %id, "Started new conversation");
    }

    if args.web {
        println!("\n=== Web server Mode ===");
        println!(
            "Web server is now available at: http://{}:{}",
            config.server.host, config.server.port
        );
        println!("Press Ctrl+C to stop the server\n");

        let state = Arc::new(AppState::new(config, Arc::clone(&assistant)));
        return serve(state).await;
    }

    Console::new(&assistant, io::stdin().lock(), io::stdout())
        .run()
        .await?;
    assistant.shutdown().await;

    Ok(())
}
