//! Ambient Loop Player (ambient-loop) - Main entry point
//!
//! Runs the loop engine behind an HTTP/SSE control API. Playback uses
//! the clock-driven virtual player backend.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ambient_common::config::{load_config, TomlConfig};
use ambient_loop::player::VirtualPlayerFactory;
use ambient_loop::{LoopEngine, LoopTiming, SharedState, SoundCatalog};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for ambient-loop
#[derive(Parser, Debug)]
#[command(name = "ambient-loop")]
#[command(about = "Seamless ambient sound loop player")]
#[command(version)]
struct Args {
    /// Path to the TOML config file (falls back to AMBIENT_CONFIG, then the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "AMBIENT_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides config)
    #[arg(short, long, env = "AMBIENT_BIND")]
    bind: Option<String>,

    /// Log level filter when RUST_LOG is unset (overrides config)
    #[arg(long, env = "AMBIENT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Sound to start playing once the engine is up
    #[arg(long)]
    autoplay: Option<String>,

    /// Track length reported by the virtual player; omit for unknown duration
    #[arg(long, env = "AMBIENT_TRACK_LENGTH_SECS")]
    track_length_secs: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    init_tracing(&args, &config)?;

    let bind = args.bind.clone().unwrap_or_else(|| config.bind_address.clone());
    let port = args.port.unwrap_or(config.port);
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;

    info!("Starting Ambient Loop Player v{}", env!("CARGO_PKG_VERSION"));

    let track_length = args
        .track_length_secs
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(Duration::from_secs_f64);
    info!("Virtual player track length: {:?}", track_length);

    let state = Arc::new(SharedState::new(config.default_volume));
    let engine = Arc::new(LoopEngine::new(
        state,
        SoundCatalog::reference(),
        LoopTiming::from(&config.timing),
        Arc::new(VirtualPlayerFactory::new(track_length)),
    ));
    engine
        .try_initialize()
        .await
        .context("Failed to initialize loop engine")?;

    if let Some(sound) = &args.autoplay {
        let engine = Arc::clone(&engine);
        let sound = sound.clone();
        tokio::spawn(async move {
            engine.play(&sound).await;
        });
    }

    let served = ambient_loop::api::run(addr, Arc::clone(&engine), shutdown_signal()).await;

    engine.dispose().await;
    served.context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Install the global subscriber: EnvFilter plus a console fmt layer, and a
/// plain-text file layer when `[logging] file` is set
fn init_tracing(args: &Args, config: &TomlConfig) -> Result<()> {
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("ambient_loop={level},ambient_common={level},tower_http=info").into()
    });

    let file_layer = match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
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
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
