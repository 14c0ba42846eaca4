//! Drivebox server binary.

use anyhow::Context;
use clap::Parser;
use drivebox::api::routes::create_router;
use drivebox::{AppConfig, AppState, SqliteStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Drivebox - multi-user file-storage platform server.
#[derive(Parser, Debug)]
#[command(
    name = "drivebox-server",
    version,
    about = "Drivebox - multi-user file-storage platform server"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "drivebox.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config).context("failed to load configuration")?;

    let default_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.server.log_level.clone()
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let jwt_secret = config.jwt_secret().context("failed to resolve signing secret")?;

    let store = SqliteStore::new_local(&config.database.path)
        .await
        .context("failed to open user store")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, Arc::new(store), jwt_secret);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "drivebox server listening");

    axum::serve(listener, app)
        .await
        .context("server terminated")?;

    Ok(())
}
