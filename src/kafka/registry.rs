//! Schema Registry client.
//!
//! # Responsibilities
//! - Validate the registry endpoint and topic before any network call
//! - Build `{endpoint}/subjects/{topic}-{role}/versions`
//! - POST the schema document and parse the assigned schema ID
//!
//! # Design Decisions
//! - Called once at startup; every failure is fatal to the caller
//! - The raw registry body is kept on errors for diagnostics

use std::fmt;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Content type expected by the Schema Registry.
pub const SCHEMA_REGISTRY_CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// Schema identifier assigned by the registry.
pub type SchemaId = i32;

/// Which part of a Kafka record a schema describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaRole {
    Key,
    Value,
}

impl SchemaRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaRole::Key => "key",
            SchemaRole::Value => "value",
        }
    }
}

impl fmt::Display for SchemaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while registering a schema.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Endpoint lacks a scheme separator or is not a valid URL.
    #[error("bad endpoint value: {0:?}")]
    InvalidEndpoint(String),

    /// Topic is empty.
    #[error("bad topic value: {0:?}")]
    InvalidTopic(String),

    /// Request could not be built or sent.
    #[error("schema registry request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response body could not be read.
    #[error("failed to read the schema registry response: {0}")]
    ReadBody(#[source] reqwest::Error),

    /// Registry answered with a non-200 status.
    #[error("error while registering schema: {status}")]
    Rejected { status: StatusCode, body: String },

    /// Registry answered 200 without a usable integer `id`.
    #[error("malformed schema registry response {body:?}: {source}")]
    Malformed {
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct RegisteredSchema {
    id: SchemaId,
}

/// Registers schemas with a Confluent-compatible Schema Registry.
#[derive(Debug, Clone)]
pub struct SchemaRegistrar {
    client: reqwest::Client,
}

impl SchemaRegistrar {
    /// Create a registrar whose requests are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Register `schema` for `topic` and return the assigned ID.
    pub async fn register(
        &self,
        schema: &str,
        role: SchemaRole,
        endpoint: &str,
        topic: &str,
    ) -> Result<SchemaId, RegistryError> {
        let url = registration_url(endpoint, topic, role)?;
        let payload = serde_json::json!({ "schema": schema });

        tracing::info!(role = %role, url = %url, "Registering schema");

        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, SCHEMA_REGISTRY_CONTENT_TYPE)
            .body(payload.to_string())
            .send()
            .await
            .inspect_err(|e| tracing::error!(url = %url, error = %e, "Schema registration failed"))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "Failed to read the schema registry response");
            RegistryError::ReadBody(e)
        })?;

        if status != StatusCode::OK {
            tracing::error!(status = %status, body = %body, "Schema registry error");
            return Err(RegistryError::Rejected { status, body });
        }

        let registered: RegisteredSchema = match serde_json::from_str(&body) {
            Ok(r) => r,
            Err(source) => {
                tracing::error!(body = %body, "Failed to decode the schema registry response");
                return Err(RegistryError::Malformed { body, source });
            }
        };

        tracing::info!(
            schema_id = registered.id,
            response = %body,
            "Parsed schema ID from the schema registry response"
        );
        Ok(registered.id)
    }
}

/// Build the registration URL for `topic`, checking the preconditions.
///
/// The endpoint's own path is kept and joined with `subjects/{topic}-{role}/versions`
/// using path semantics: empty and `.` segments vanish, `..` pops a segment.
pub fn registration_url(endpoint: &str, topic: &str, role: SchemaRole) -> Result<Url, RegistryError> {
    if !endpoint.contains("://") {
        return Err(RegistryError::InvalidEndpoint(endpoint.to_string()));
    }
    if topic.is_empty() {
        return Err(RegistryError::InvalidTopic(topic.to_string()));
    }

    let mut url =
        Url::parse(endpoint).map_err(|_| RegistryError::InvalidEndpoint(endpoint.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(RegistryError::InvalidEndpoint(endpoint.to_string()));
    }

    let subject = format!("{}-{}", topic, role);
    let path = join_path(&[url.path(), "subjects", &subject, "versions"]);
    url.set_path(&path);
    Ok(url)
}

fn join_path(parts: &[&str]) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in parts.iter().flat_map(|p| p.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}
