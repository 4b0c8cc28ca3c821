//! Kafka REST Proxy envelope encoding.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::http::request::RequestInfo;
use crate::kafka::registry::{RegistryError, SchemaId, SchemaRegistrar, SchemaRole};

/// Default location of the request schema document.
pub const DEFAULT_SCHEMA_LOCATION: &str = "./request.avsc";

/// Errors from loading, registering or encoding with a [`KafkaCodec`].
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to read schema {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't register the schema: {0}")]
    Register(#[from] RegistryError),

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Kafka REST Proxy request body: one record keyed by a registered value schema.
#[derive(Debug, Serialize)]
pub struct Envelope<'a> {
    pub value_schema_id: SchemaId,
    pub records: [Record<'a>; 1],
}

#[derive(Debug, Serialize)]
pub struct Record<'a> {
    pub value: &'a RequestInfo,
}

/// Loaded schema document, not yet registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSchema(String);

impl ValueSchema {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Read the schema document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CodecError::Load {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Registered value schema used to encode every captured request.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaCodec {
    value_schema: String,
    value_schema_id: SchemaId,
}

impl KafkaCodec {
    /// Build a codec for a schema that is already registered.
    pub fn new(value_schema: impl Into<String>, value_schema_id: SchemaId) -> Self {
        Self {
            value_schema: value_schema.into(),
            value_schema_id,
        }
    }

    /// Register `schema` as the value schema of `topic`.
    pub async fn register(
        schema: ValueSchema,
        registrar: &SchemaRegistrar,
        endpoint: &str,
        topic: &str,
    ) -> Result<Self, CodecError> {
        let id = registrar
            .register(schema.as_str(), SchemaRole::Value, endpoint, topic)
            .await?;
        Ok(Self::new(schema.0, id))
    }

    pub fn value_schema(&self) -> &str {
        &self.value_schema
    }

    pub fn value_schema_id(&self) -> SchemaId {
        self.value_schema_id
    }

    /// Encode `request` into the Kafka REST Proxy JSON envelope.
    pub fn encode(&self, request: &RequestInfo) -> Result<Vec<u8>, CodecError> {
        let envelope = Envelope {
            value_schema_id: self.value_schema_id,
            records: [Record { value: request }],
        };
        Ok(serde_json::to_vec(&envelope)?)
    }
}
