//! Device relay (v1)
//!
//! HTTP bridge between web clients and an external device controller.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────────┐
//!                     │                    DEVICE RELAY                     │
//!   Client Request    │  ┌─────────┐   ┌──────────┐   ┌───────────────┐    │
//!   ──────────────────┼─▶│  http   │──▶│ dispatch │──▶│ security/auth │    │
//!                     │  │ server  │   └────┬─────┘   └───────────────┘    │
//!                     │  └─────────┘        │                               │
//!                     │          ┌──────────┴───────────┐                   │
//!                     │          ▼                      ▼                   │
//!                     │   ┌────────────┐         ┌────────────┐             │
//!                     │   │  routing   │         │   queue    │◀────────────┼──── Controller
//!                     │   │ root/*.xml │         │ queries/   │────────────▶┼───▶ (polls files)
//!                     │   └────────────┘         └────────────┘             │
//!                     │                                                     │
//!                     │  config · observability · resilience · lifecycle    │
//!                     └────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use device_relay::config::loader::load_config;
use device_relay::config::watcher::KeysFileWatcher;
use device_relay::lifecycle::{signals, startup, Shutdown};
use device_relay::observability::{logging, metrics};
use device_relay::HttpServer;

#[derive(Parser)]
#[command(name = "device-relay")]
#[command(about = "HTTP relay between web clients and a device controller", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "relay.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_logging(&config.observability);
    tracing::info!("device-relay v0.1.0 starting");
    tracing::info!(
        config = %args.config.display(),
        bind_address = %config.listener.bind_address,
        root = %config.storage.root_dir.display(),
        mode = ?config.queue.mode,
        request_timeout_secs = config.timeouts.request_secs,
        io_timeout_ms = config.timeouts.io_ms,
        "Configuration loaded"
    );

    startup::prepare_storage(&config.storage)?;
    let allow_list = startup::load_allow_list(&config.auth)?;

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?);
    }

    // Keep the watcher handle alive for the lifetime of the server.
    let (_keys_watcher, allow_list_updates) = match KeysFileWatcher::new(&config.auth) {
        Some((watcher, rx)) if config.auth.watch_keys_file => (Some(watcher.run()?), rx),
        _ => (None, mpsc::unbounded_channel().1),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::termination().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config, allow_list);
    server.run(listener, allow_list_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
