//! Kafka integration subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     request.avsc → codec.rs (ValueSchema::load)
//!     → registry.rs (POST {registry}/subjects/{topic}-value/versions)
//!     → KafkaCodec { value_schema, value_schema_id } shared via Arc
//!
//! Per request:
//!     RequestInfo → codec.rs (envelope JSON)
//!     → rest.rs (POST {rest-endpoint}) → buffered proxy response
//! ```

pub mod codec;
pub mod registry;
pub mod rest;

pub use codec::{CodecError, KafkaCodec, ValueSchema};
pub use registry::{RegistryError, SchemaId, SchemaRegistrar, SchemaRole};
pub use rest::{ForwardError, ProxyResponse, RestProxyClient};
