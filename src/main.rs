//! Raw Kafka Gateway
//!
//! Captures arbitrary HTTP requests and publishes them to Kafka through a
//! Kafka REST Proxy, relaying the proxy's answer back to the caller.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request        ┌──────────────────────────────────────────────┐
//!     ─────────────────────▶│ http::server ─▶ http::request (RequestInfo)  │
//!                           │                      │                        │
//!                           │                      ▼                        │
//!                           │              kafka::codec (envelope)          │
//!                           │                      │                        │      Kafka
//!     Client Response       │                      ▼                        │    REST Proxy
//!     ◀─────────────────────│ http::response ◀─ kafka::rest ───────────────┼──────────▶
//!                           │                                               │
//!                           │  startup: config ─▶ kafka::registry (schema ID)│
//!                           └──────────────────────────────────────────────┘
//! ```

use clap::Parser;

use raw_kafka_gateway::config::Cli;
use raw_kafka_gateway::lifecycle::{signals, startup, Shutdown};
use raw_kafka_gateway::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = startup::resolve_config(cli)?;

    logging::init_logging(&config.observability)?;
    tracing::info!("raw-kafka-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(&shutdown);

    if let Err(e) = startup::start(config, &shutdown).await {
        tracing::error!(error = %e, "Gateway failed");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
