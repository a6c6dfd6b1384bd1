//! Integrator Gateway
//!
//! A registration-based reverse proxy built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                  INTEGRATOR GATEWAY                   │
//!                      │                                                       │
//!   Backend            │  ┌─────────┐    ┌──────────┐    ┌──────────────┐     │
//!   POST /deploy ──────┼─▶│  http   │───▶│ registry │───▶│    store     │     │
//!                      │  │ server  │    │  index   │    │    (redb)    │     │
//!                      │  └────┬────┘    └────┬─────┘    └──────────────┘     │
//!                      │       │              │  ▲                             │
//!   Client             │       ▼              │  │ evict                       │
//!   /proxy/{app}/... ──┼─▶┌──────────┐        │  ┌┴────────────┐               │
//!                      │  │  proxy   │◀───────┘  │   health    │               │
//!                      │  │dispatcher│           │  liveness   │               │
//!                      │  └────┬─────┘           └─────────────┘               │
//!                      │       │ forward                                       │
//!                      └───────┼───────────────────────────────────────────────┘
//!                              ▼
//!                         Application backend
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use integrator_gateway::config::{load_config, GatewayConfig};
use integrator_gateway::health::LivenessChecker;
use integrator_gateway::lifecycle::{signals, Shutdown};
use integrator_gateway::observability::{init_logging, metrics};
use integrator_gateway::registry::Registry;
use integrator_gateway::store::{RedbStore, Store};
use integrator_gateway::GatewayServer;

#[derive(Parser)]
#[command(name = "integrator-gateway")]
#[command(about = "Registration-based reverse proxy", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    init_logging(&config.observability)?;

    tracing::info!("integrator-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        store = ?config.store.path,
        eviction_enabled = config.eviction.enabled,
        eviction_interval_secs = config.eviction.interval_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store: Arc<dyn Store> = match &config.store.path {
        Some(path) => Arc::new(RedbStore::open(path)?),
        None => {
            tracing::warn!("No store path configured; deployments will not survive a restart");
            Arc::new(RedbStore::open_in_memory()?)
        }
    };

    let registry = Arc::new(Registry::new(store, LivenessChecker::new(&config.liveness)?));
    registry.bootstrap()?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    tokio::spawn(signals::listen(shutdown.clone()));

    let server = GatewayServer::new(&config, registry.clone())?;
    server.run(listener, shutdown).await?;

    registry.teardown();
    tracing::info!("Shutdown complete");
    Ok(())
}
