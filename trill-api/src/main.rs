//! trill-api - Music catalog and streaming backend
//!
//! Serves the account, catalog, playlist, and search HTTP API over a
//! SQLite store. One process, one database file, zero-config startup.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trill_api::{build_router, AppState};
use trill_common::auth::TokenService;
use trill_common::config;
use trill_common::db::{init_database, settings};

/// Command-line arguments for trill-api
#[derive(Parser, Debug)]
#[command(name = "trill-api")]
#[command(about = "Music catalog and streaming backend")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5720", env = "TRILL_PORT")]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1", env = "TRILL_HOST")]
    host: String,

    /// Data folder holding the database (falls back to TRILL_DATA_FOLDER,
    /// then the config file, then the platform default)
    #[arg(short, long)]
    data_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trill_api=debug,trill_common=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting Trill API v{}", env!("CARGO_PKG_VERSION"));

    // Data folder: CLI flag, then env var, then config file, then default
    let data_folder = config::resolve_data_folder(
        args.data_folder.as_deref(),
        "TRILL_DATA_FOLDER",
        Some("data_folder"),
    )
    .context("Failed to resolve data folder")?;
    let db_path = config::database_path(&data_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    // The signing key lives in the settings table; first run generates it
    let signing_key = settings::load_or_init_signing_key(&pool)
        .await
        .context("Failed to load token signing key")?;
    let ttl_seconds = settings::token_ttl_seconds(&pool)
        .await
        .context("Failed to load token lifetime setting")?;
    let tokens = TokenService::new(signing_key, ttl_seconds);

    let state = AppState::new(pool, tokens);
    let app = build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("trill-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
