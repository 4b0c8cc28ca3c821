//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check endpoint shapes before any network call
//! - Validate value ranges (timeouts > 0, body limit > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::Uri;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::security::headers::HeaderSet;

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("listener.ping_path {0:?} must start with '/' and contain no ':', '*', '{{' or '}}'")]
    PingPath(String),

    #[error("kafka.topic must not be empty")]
    EmptyTopic,

    #[error("kafka.rest_endpoint {0:?} must be an absolute http:// URL")]
    RestEndpoint(String),

    #[error("kafka.schema_registry_url {0:?} must contain a scheme (://)")]
    SchemaRegistryUrl(String),

    #[error("headers.{field} contains invalid header name {name:?}")]
    HeaderName { field: &'static str, name: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("timeouts.request_secs ({request}) must be greater than timeouts.upstream_secs ({upstream})")]
    RequestTimeout { request: u64, upstream: u64 },

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

/// Validate a fully layered configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if !is_literal_route(&config.listener.ping_path) {
        errors.push(ValidationError::PingPath(config.listener.ping_path.clone()));
    }

    if config.kafka.topic.is_empty() {
        errors.push(ValidationError::EmptyTopic);
    }
    if !is_http_uri(&config.kafka.rest_endpoint) {
        errors.push(ValidationError::RestEndpoint(config.kafka.rest_endpoint.clone()));
    }
    if !config.kafka.schema_registry_url.contains("://") {
        errors.push(ValidationError::SchemaRegistryUrl(
            config.kafka.schema_registry_url.clone(),
        ));
    }

    for (field, names) in [
        ("excluded", &config.headers.excluded),
        ("ip_forwarding", &config.headers.ip_forwarding),
    ] {
        if let Err(e) = HeaderSet::from_names(names) {
            errors.push(ValidationError::HeaderName { field, name: e.0 });
        }
    }

    for (field, value) in [
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("timeouts.registry_secs", config.timeouts.registry_secs),
        ("limits.max_body_bytes", config.limits.max_body_bytes as u64),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    let timeouts = &config.timeouts;
    if timeouts.upstream_secs > 0 && timeouts.request_secs <= timeouts.upstream_secs {
        errors.push(ValidationError::RequestTimeout {
            request: timeouts.request_secs,
            upstream: timeouts.upstream_secs,
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// An absolute path the router matches literally.
pub fn is_literal_route(path: &str) -> bool {
    path.starts_with('/') && !path.contains([':', '*', '{', '}'])
}

fn is_http_uri(value: &str) -> bool {
    match value.parse::<Uri>() {
        Ok(uri) => uri.scheme_str() == Some("http") && uri.authority().is_some(),
        Err(_) => false,
    }
}
