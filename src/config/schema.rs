//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::kafka::codec::DEFAULT_SCHEMA_LOCATION;
use crate::security::headers::{DEFAULT_EXCLUDED_HEADERS, DEFAULT_IP_FORWARDING_HEADERS};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, ping path).
    pub listener: ListenerConfig,

    /// Kafka REST Proxy and Schema Registry settings.
    pub kafka: KafkaConfig,

    /// Header capture settings.
    pub headers: HeaderSettings,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:7000").
    pub bind_address: String,

    /// Path answered with `pong`.
    pub ping_path: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:7000".to_string(),
            ping_path: "/ping".to_string(),
        }
    }
}

/// Kafka-side endpoints and topic.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct KafkaConfig {
    /// Topic the records are published to.
    pub topic: String,

    /// Kafka REST Proxy produce endpoint, e.g. `http://rest:8082/topics/RawRequest`.
    pub rest_endpoint: String,

    /// Path to the Avro schema document.
    pub schema_location: String,

    /// Schema Registry base URL.
    pub schema_registry_url: String,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            topic: "RawRequest".to_string(),
            rest_endpoint: String::new(),
            schema_location: DEFAULT_SCHEMA_LOCATION.to_string(),
            schema_registry_url: String::new(),
        }
    }
}

/// Header capture configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HeaderSettings {
    /// Headers never forwarded downstream.
    pub excluded: Vec<String>,

    /// Headers consulted for the client IP, highest priority first.
    pub ip_forwarding: Vec<String>,

    /// Remove excluded headers from captured requests before encoding.
    pub redact_excluded: bool,
}

impl Default for HeaderSettings {
    fn default() -> Self {
        Self {
            excluded: split_list(DEFAULT_EXCLUDED_HEADERS),
            ip_forwarding: split_list(DEFAULT_IP_FORWARDING_HEADERS),
            redact_excluded: true,
        }
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',').map(str::to_string).collect()
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time for handling one inbound request, in seconds.
    pub request_secs: u64,

    /// REST proxy call timeout in seconds.
    pub upstream_secs: u64,

    /// Schema Registry call timeout in seconds.
    pub registry_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 10,
            registry_secs: 10,
        }
    }
}

/// Size limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest body captured; larger bodies are recorded as read failures.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "raw_kafka_gateway=info,tower_http=info".to_string(),
            log_format: LogFormat::Text,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
