//! Command-line flags and environment overrides.
//!
//! Every flag falls back to an environment variable; anything left unset keeps the value
//! from the config file or the built-in default.

use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::{GatewayConfig, LogFormat};
use crate::security::headers::{EXCLUDED_HEADERS_ENV, IP_FORWARDING_HEADERS_ENV};

#[derive(Debug, Parser)]
#[command(name = "raw-kafka-gateway")]
#[command(about = "Forward raw HTTP requests to a Kafka REST Proxy", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, env = "RAWKAFKA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Host IP to bind to
    #[arg(long, env = "RAWKAFKA_HOST")]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(long, env = "RAWKAFKA_PORT")]
    pub port: Option<u16>,

    /// Name of the topic to publish the messages to
    #[arg(long, env = "RAWKAFKA_TOPIC")]
    pub topic: Option<String>,

    /// Kafka REST endpoint
    #[arg(long, env = "RAWKAFKA_REST_ENDPOINT")]
    pub rest_endpoint: Option<String>,

    /// Avro schema location
    #[arg(long, env = "RAWKAFKA_SCHEMA_LOCATION")]
    pub schema_location: Option<String>,

    /// Schema registry URL
    #[arg(long, env = "RAWKAFKA_SCHEMA_REGISTRY_URL")]
    pub schema_registry_url: Option<String>,

    /// Path for the ping endpoint
    #[arg(long, env = "RAWKAFKA_PING_PATH")]
    pub ping_path: Option<String>,

    /// Comma-separated headers excluded from capture
    #[arg(long, env = EXCLUDED_HEADERS_ENV, value_delimiter = ',')]
    pub excluded_headers: Option<Vec<String>>,

    /// Comma-separated headers consulted for the client IP, highest priority first
    #[arg(long, env = IP_FORWARDING_HEADERS_ENV, value_delimiter = ',')]
    pub ip_forwarding_headers: Option<Vec<String>>,

    /// Log output format
    #[arg(long, env = "RAWKAFKA_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,

    /// Serve Prometheus metrics on this address
    #[arg(long, env = "RAWKAFKA_METRICS_ADDRESS")]
    pub metrics_address: Option<String>,
}

impl Cli {
    /// Overlay the flags that were set onto `config`.
    pub fn apply(self, config: &mut GatewayConfig) {
        if self.host.is_some() || self.port.is_some() {
            let (default_host, default_port) = split_bind(&config.listener.bind_address);
            let host = self.host.unwrap_or(default_host);
            let port = self.port.unwrap_or(default_port);
            config.listener.bind_address = if host.contains(':') {
                format!("[{}]:{}", host, port)
            } else {
                format!("{}:{}", host, port)
            };
        }
        if let Some(topic) = self.topic {
            config.kafka.topic = topic;
        }
        if let Some(endpoint) = self.rest_endpoint {
            config.kafka.rest_endpoint = endpoint;
        }
        if let Some(location) = self.schema_location {
            config.kafka.schema_location = location;
        }
        if let Some(url) = self.schema_registry_url {
            config.kafka.schema_registry_url = url;
        }
        if let Some(path) = self.ping_path {
            config.listener.ping_path = if path.starts_with('/') {
                path
            } else {
                format!("/{}", path)
            };
        }
        if let Some(names) = non_blank(self.excluded_headers) {
            config.headers.excluded = names;
        }
        if let Some(names) = non_blank(self.ip_forwarding_headers) {
            config.headers.ip_forwarding = names;
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
        if let Some(address) = self.metrics_address {
            config.observability.metrics_enabled = true;
            config.observability.metrics_address = address;
        }
    }
}

fn split_bind(bind_address: &str) -> (String, u16) {
    match bind_address.parse::<std::net::SocketAddr>() {
        Ok(addr) => (addr.ip().to_string(), addr.port()),
        Err(_) => ("0.0.0.0".to_string(), 7000),
    }
}

fn non_blank(names: Option<Vec<String>>) -> Option<Vec<String>> {
    names.filter(|names| names.iter().any(|n| !n.trim().is_empty()))
}
