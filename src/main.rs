// Riffwise - music practice studio backend
// Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use riffwise::config::{load_config, Config};
use riffwise::generation::FallbackOrchestrator;
use riffwise::providers::{CallOptions, ProviderRegistry};
use riffwise::server::{self, AppState};
use riffwise::store::{seed_demo_data, Store};

#[derive(Parser, Debug)]
#[command(name = "riffwise", version, about = "Chord charts, tabs, lessons and lyrics from LLM providers")]
struct Cli {
    /// Path to the TOML config file (default: ~/.riffwise/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the server bind address
    #[arg(long, global = true)]
    bind: Option<String>,

    /// Override the SQLite database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Skip the startup provider probe
    #[arg(long, global = true)]
    no_probe: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Populate the database with demo data and exit
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    if let Some(db) = cli.db {
        config.database.path = Some(db);
    }
    if cli.no_probe {
        config.providers.probe_on_startup = false;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Seed => seed(config).await,
    }
}

async fn seed(config: Config) -> Result<()> {
    let store = Store::open(&config.database_path())?;
    if seed_demo_data(&store).await? {
        println!("Seeded demo data into {}", config.database_path().display());
    } else {
        println!("Database already contains data; nothing to seed");
    }
    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    let store = Store::open(&config.database_path())?;
    if config.database.seed_on_startup {
        seed_demo_data(&store).await?;
    }

    let registry = Arc::new(ProviderRegistry::initialize(&config).await?);
    for status in registry.status() {
        tracing::info!(
            provider = %status.name,
            model = %status.model,
            available = status.available,
            rank = status.rank,
            "Provider registered"
        );
    }

    let orchestrator = Arc::new(FallbackOrchestrator::new(
        registry,
        CallOptions::from(&config.generation),
    ));
    let state = Arc::new(AppState::new(
        orchestrator,
        store,
        Duration::from_secs(config.server.request_timeout_secs),
    ));

    server::serve(&config.server, state).await
}
