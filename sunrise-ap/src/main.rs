//! Sunrise Audio Player (sunrise-ap) - Main entry point
//!
//! Plays one local audio source and fades it in or out on HTTP triggers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sunrise_ap::api::{self, AppContext};
use sunrise_ap::audio::{AudioDevice, OutputDevice};
use sunrise_ap::config::{AppConfig, CliOverrides};
use sunrise_ap::fade::{start_percent, FadeController};
use sunrise_ap::SharedState;
use sunrise_common::config::TomlConfig;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for sunrise-ap
#[derive(Parser, Debug)]
#[command(name = "sunrise-ap")]
#[command(about = "Remote-triggered fade-in/fade-out audio player")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, env = "SUNRISE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(short, long, env = "SUNRISE_BIND")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SUNRISE_PORT")]
    port: Option<u16>,

    /// Audio file played by fade-in
    #[arg(short, long, env = "SUNRISE_SOURCE")]
    source: Option<PathBuf>,

    /// Output device name (system default if omitted)
    #[arg(short, long, env = "SUNRISE_DEVICE")]
    device: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins; otherwise start at info and switch to the configured
    // level once the config file has been read
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let toml = TomlConfig::load(args.config.as_deref()).context("Failed to load config file")?;
    let config = AppConfig::resolve(
        CliOverrides {
            bind: args.bind,
            port: args.port,
            source: args.source,
            device: args.device,
        },
        toml,
    )
    .context("Invalid configuration")?;

    if !from_env {
        if let Err(e) = filter_handle.reload(EnvFilter::new(&config.log_level)) {
            warn!("Failed to apply log level '{}': {}", config.log_level, e);
        }
    }

    info!(
        "Starting Sunrise Audio Player v{} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );
    info!("Audio source: {}", config.source.display());

    let device = OutputDevice::open(config.device.as_deref(), Some(config.source.clone()))
        .context("Failed to open audio output")?;
    info!(
        "Audio output: {} @ {} Hz",
        device.device_name(),
        device.sample_rate()
    );

    let state = Arc::new(SharedState::new(start_percent(device.get_volume())));
    let controller = FadeController::new(Box::new(device), state)
        .with_defaults(config.fade_in, config.fade_out)
        .context("Invalid fade defaults")?;

    let ctx = AppContext::new(controller);

    api::run(config.socket_addr(), ctx, shutdown_signal())
        .await
        .context("Server error")?;

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
            Ok(mut sig) => {
                sig.recv().await;
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
