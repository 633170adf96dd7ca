//! Music bot (mmb-bot) - Main entry point
//!
//! Startup order: tracing, configuration, database, catalog scan, audio
//! output, playback engine, command router, HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mmb_bot::api::{self, AppContext};
use mmb_bot::audio::{DiscardSink, StreamingOutput};
use mmb_bot::catalog::{self, Catalog};
use mmb_bot::commands::BotCommandHandler;
use mmb_bot::PlaybackEngine;
use mmb_common::config::{self, BotConfig, ConfigOverrides};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for mmb-bot
#[derive(Parser, Debug)]
#[command(name = "mmb-bot")]
#[command(about = "Playlist-driven music bot with chat and HTTP control")]
#[command(version)]
struct Args {
    /// SQLite catalog database
    #[arg(long, env = "BOT_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Root folder containing music files
    #[arg(short, long, env = "MUSIC_PATH")]
    music_path: Option<PathBuf>,

    /// HTTP control port
    #[arg(short, long, env = "CONTROLLER_ENDPOINT_PORT")]
    port: Option<u16>,

    /// Prefix marking chat messages as commands
    #[arg(long, env = "NOWPLAYING_COMMAND")]
    command_prefix: Option<String>,

    /// Tracks per page for the tracks command
    #[arg(long)]
    tracks_page_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// TOML config file
    #[arg(short, long, env = "MMB_CONFIG")]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            database_path: self.db_path.clone(),
            music_path: self.music_path.clone(),
            port: self.port,
            command_prefix: self.command_prefix.clone(),
            tracks_page_size: self.tracks_page_size,
            log_level: self.log_level.clone(),
        }
    }
}

fn init_tracing(level: &str) {
    let default_filter = format!("mmb_bot={level},mmb_common={level},tower_http={level}");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The TOML file may carry the log level, so it is read before tracing
    // starts; its own log lines are lost.
    let file_config = config::load_toml_config(args.config.as_deref())
        .context("Failed to load config file")?;
    let config = BotConfig::resolve(args.overrides(), file_config).context("Invalid configuration")?;

    init_tracing(&config.log_level);
    info!("Starting mmb-bot v{}", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", config.database_path.display());
    info!("Music folder: {}", config.music_path.display());

    let pool = mmb_common::db::connect(&config.database_path)
        .await
        .context("Failed to open database")?;

    catalog::scan_music_folder(&pool, &config.music_path)
        .await
        .context("Failed to scan music folder")?;
    let catalog = Catalog::new(pool);

    let output = Arc::new(StreamingOutput::new(DiscardSink));
    let engine = PlaybackEngine::new(output);
    info!("Playback engine initialized");

    let commands = Arc::new(BotCommandHandler::new(
        engine.clone(),
        catalog.clone(),
        config.command_prefix.clone(),
        config.tracks_page_size,
    ));

    let app = api::create_router(AppContext {
        engine: engine.clone(),
        catalog,
        commands,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    engine.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
