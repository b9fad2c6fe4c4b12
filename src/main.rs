//! Plinth
//!
//! A minimal, reparenting-less X11 window manager: right-click raises,
//! right-drag moves, Mod1+Return opens a terminal, and clients get the
//! geometry they ask for.

mod config;
mod error;
mod wm;
mod x11_async;

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::{Shutdown, WmError};
use crate::wm::WindowManager;
use crate::wm::display::Display;
use crate::wm::startup::DetachedLauncher;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "plinth=info,warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Running Plinth");

    match run().await {
        Ok(reason) => {
            info!("Shut down: {}", reason);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("plinth: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<Shutdown, WmError> {
    let config = Config::default();
    let display = Display::connect(None)?;
    let mut wm = WindowManager::start(display, DetachedLauncher, config)?;

    let result = wm::dispatch::run_until(&mut wm, shutdown_signal()).await;
    if let Ok(Shutdown::ConnectionClosed) = result {
        eprintln!("plinth: display connection closed by server");
    }
    result
}

/// Resolves on SIGINT or SIGTERM, never if the handlers can't be installed
async fn shutdown_signal() -> &'static str {
    match wait_for_signal().await {
        Ok(name) => name,
        Err(e) => {
            warn!("Signal handling unavailable: {:#}", e);
            std::future::pending().await
        }
    }
}

async fn wait_for_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

    tokio::select! {
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigint.recv() => Ok("SIGINT"),
    }
}
