//! Startup orchestration.
//!
//! # Responsibilities
//! - Layer and validate configuration
//! - Load the schema document and register it with the Schema Registry
//! - Start the metrics exporter when enabled
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Registration completes before the listener is bound, so every handler sees
//!   the final schema ID without synchronization

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{read_config, validate_config, Cli, ConfigError, GatewayConfig};
use crate::http::server::{HttpServer, ServerError};
use crate::kafka::{CodecError, KafkaCodec, RegistryError, SchemaRegistrar, ValueSchema};
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Layer defaults, the optional config file and CLI/env overrides, then validate.
pub fn resolve_config(cli: Cli) -> Result<GatewayConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => GatewayConfig::default(),
    };
    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load the value schema and register it for the configured topic.
pub async fn register_codec(config: &GatewayConfig) -> Result<Arc<KafkaCodec>, StartupError> {
    let schema = ValueSchema::load(&config.kafka.schema_location)?;
    let registrar = SchemaRegistrar::new(Duration::from_secs(config.timeouts.registry_secs))?;

    let codec = KafkaCodec::register(
        schema,
        &registrar,
        &config.kafka.schema_registry_url,
        &config.kafka.topic,
    )
    .await?;

    tracing::info!(
        topic = %config.kafka.topic,
        schema_id = codec.value_schema_id(),
        schema_bytes = codec.value_schema().len(),
        "Value schema registered"
    );
    Ok(Arc::new(codec))
}

/// Run the gateway until `shutdown` is triggered.
pub async fn start(config: GatewayConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        topic = %config.kafka.topic,
        rest_endpoint = %config.kafka.rest_endpoint,
        schema_registry_url = %config.kafka.schema_registry_url,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let address = &config.observability.metrics_address;
        let addr: SocketAddr = address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let codec = register_codec(&config).await?;
    let server = HttpServer::new(config.clone(), codec)?;

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn resolves_flags_over_defaults() {
        let cli = Cli::try_parse_from([
            "raw-kafka-gateway",
            "--rest-endpoint",
            "http://localhost:8082/topics/RawRequest",
            "--schema-registry-url",
            "http://localhost:8081",
        ])
        .unwrap();

        let config = resolve_config(cli).unwrap();
        assert_eq!(config.kafka.rest_endpoint, "http://localhost:8082/topics/RawRequest");
        assert_eq!(config.kafka.topic, "RawRequest");
    }

    #[test]
    fn file_layer_is_validated_after_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[kafka]\ntopic = \"\"\n").unwrap();
        let path = file.path().to_str().unwrap();

        let cli = Cli::try_parse_from(["raw-kafka-gateway", "--config", path]).unwrap();
        match resolve_config(cli).unwrap_err() {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 3),
            other => panic!("unexpected error: {}", other),
        }

        let cli = Cli::try_parse_from([
            "raw-kafka-gateway",
            "--config",
            path,
            "--topic",
            "Clicks",
            "--rest-endpoint",
            "http://localhost:8082/topics/Clicks",
            "--schema-registry-url",
            "http://localhost:8081",
        ])
        .unwrap();
        assert_eq!(resolve_config(cli).unwrap().kafka.topic, "Clicks");
    }

    #[tokio::test]
    async fn missing_schema_is_fatal() {
        let mut config = GatewayConfig::default();
        config.kafka.schema_location = "/nonexistent/request.avsc".into();
        config.kafka.schema_registry_url = "http://127.0.0.1:9".into();

        let err = register_codec(&config).await.unwrap_err();
        assert!(matches!(err, StartupError::Codec(CodecError::Load { .. })));
    }

    #[tokio::test]
    async fn bad_registry_url_is_fatal() {
        let mut config = GatewayConfig::default();
        config.kafka.schema_location = concat!(env!("CARGO_MANIFEST_DIR"), "/request.avsc").into();
        config.kafka.schema_registry_url = "registry.local/api".into();

        let err = register_codec(&config).await.unwrap_err();
        assert!(matches!(
            err,
            StartupError::Codec(CodecError::Register(RegistryError::InvalidEndpoint(_)))
        ));
    }
}
