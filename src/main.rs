//! Arbiter
//!
//! A small reparenting X11 window manager built around per-client event
//! arbitration.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arbiter::config::Config;
use arbiter::wm::WindowManager;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (default: ~/.config/arbiter/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replace the existing window manager
    #[arg(long, short)]
    replace: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.filter.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting arbiter");
    if args.replace {
        info!("--replace given: will replace the running window manager");
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                _ = sigint.recv() => info!("Received SIGINT, shutting down"),
            }
            let _ = shutdown_tx.send(()).await;
        });
    }

    let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X server")?;
    let conn = Arc::new(conn);
    info!("Connected to X server, screen {}", screen_num);

    let mut wm = WindowManager::new(conn, screen_num, &config, args.replace)?;
    wm.scan()?;

    if let Err(e) = wm.run(shutdown_rx).await {
        error!("Window manager error: {:#}", e);
        return Err(e);
    }

    info!("Exiting");
    Ok(())
}
