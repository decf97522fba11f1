//! # BookRelay — booking push notification relay
//!
//! Watches the booking change feed and fans out push notifications to the
//! interested parties, pruning dead device tokens as a side effect.
//!
//! Usage:
//!   bookrelay                          # Run with ~/.bookrelay/config.toml
//!   bookrelay --config ./relay.toml    # Explicit config file
//!   bookrelay --verbose                # Debug logging

use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use bookrelay_core::RelayConfig;
use bookrelay_gateway::{FcmGateway, PushGateway};
use bookrelay_registry::{RestRegistry, TokenRegistry};
use bookrelay_trigger::{BookingFeed, NotificationPipeline};

#[derive(Parser)]
#[command(
    name = "bookrelay",
    version,
    about = "📨 BookRelay — booking push notification relay"
)]
struct Cli {
    /// Path to config file (default: ~/.bookrelay/config.toml)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Write a default config file to ~/.bookrelay/config.toml and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "bookrelay=debug"
    } else {
        "bookrelay=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    if cli.init_config {
        RelayConfig::default().save()?;
        println!("Wrote {}", RelayConfig::default_path().display());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => RelayConfig::load_from(path)?,
        None => RelayConfig::load()?,
    };
    if config.registry.base_url.is_empty() {
        anyhow::bail!(
            "registry.base_url is not configured — edit {}",
            RelayConfig::default_path().display()
        );
    }

    // Explicitly constructed collaborators, injected once — no globals.
    let registry: Arc<dyn TokenRegistry> = Arc::new(RestRegistry::new(&config.registry));
    let gateway: Arc<dyn PushGateway> = Arc::new(FcmGateway::new(&config.gateway)?);
    let pipeline = Arc::new(NotificationPipeline::new(registry, gateway));

    let feed = BookingFeed::new(&config.feed, &config.registry.base_url);
    let mut changes = feed.start();
    tracing::info!("📨 BookRelay running, waiting for booking changes");

    loop {
        tokio::select! {
            maybe_event = changes.next() => {
                let Some(event) = maybe_event else {
                    tracing::warn!("📡 Change stream closed");
                    break;
                };
                // Each event is its own independent pipeline task.
                let pipeline = pipeline.clone();
                tokio::spawn(async move {
                    let booking = event.booking_id.clone();
                    if let Err(e) = pipeline.handle(event).await {
                        tracing::error!(%booking, "❌ Pipeline failed: {e}");
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("👋 Shutting down");
                break;
            }
        }
    }

    Ok(())
}
