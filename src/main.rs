//! Ola greeting service.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌────────────────────────────────────────────────┐
//!                         │                     OLA                         │
//!     Inbound request     │  ┌─────────┐    ┌──────────┐    ┌───────────┐  │
//!     ────────────────────┼─▶│  http   │───▶│ handlers │───▶│  client   │──┼──▶ hola / aloha
//!     (x-b3-*, x-request- │  │ server  │    │ + inbound│    │ + tracing │  │   (same x-b3-*,
//!      id, ...)           │  └─────────┘    │ headers  │    │ headers   │  │    x-request-id)
//!                         │                 └──────────┘    └─────┬─────┘  │
//!                         │                                       │        │
//!                         │  ┌────────────────────────────────────▼─────┐  │
//!                         │  │ resilience: bulkhead, circuit breaker,   │  │
//!                         │  │ deadline, retries → fallback value       │  │
//!                         │  └──────────────────────────────────────────┘  │
//!                         └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use ola_service::config::{load_config, ServiceConfig};
use ola_service::lifecycle::{signals, Shutdown};
use ola_service::observability::{logging, metrics};
use ola_service::OlaServer;

#[derive(Parser)]
#[command(name = "ola-service")]
#[command(about = "Ola greeting service with tracing header propagation", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "OLA_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ola-service starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        hola = %config.clients.hola.base_url,
        aloha = %config.clients.aloha.base_url,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = OlaServer::new(config)?;

    let shutdown = Shutdown::new();
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        res = signals::shutdown_on_signal(&shutdown) => {
            res?;
            server_task.await??;
        }
        res = &mut server_task => res??,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
