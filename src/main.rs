//! Orchid
//!
//! A minimal X11 window manager: every window that asks to be mapped is
//! centered on the screen, raised and given input focus.

mod config;
mod shared;
mod wm;
#[cfg(unix)]
mod x11_poll;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use wm::{Interrupt, Manager};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "orchid=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Orchid");

    let config = Config::load()?;
    let interrupt = Interrupt::new();

    // SIGINT/SIGTERM end a blocking fetch through the interrupt flag
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let flag = interrupt.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
                _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
            }
            flag.raise();
        });
    }

    let mut manager = match build_manager(&config, interrupt) {
        Ok(manager) => manager,
        Err(e) => {
            error!("Failed to start window manager: {:#}", e);
            return Err(e);
        }
    };

    manager.start();

    // The display handle lives on this one blocking thread until the loop ends
    let exit = tokio::task::spawn_blocking(move || manager.run())
        .await
        .context("Window manager thread panicked")?;

    info!("Window manager exited: {:?}", exit);
    Ok(())
}

#[cfg(unix)]
fn build_manager(config: &Config, interrupt: Interrupt) -> Result<Box<dyn Manager + Send>> {
    let manager =
        wm::XDisplayManager::connect(config, interrupt).context("Failed to connect to X server")?;
    Ok(Box::new(manager))
}

#[cfg(not(unix))]
fn build_manager(_config: &Config, _interrupt: Interrupt) -> Result<Box<dyn Manager + Send>> {
    Ok(Box::new(wm::NullManager::new()))
}
