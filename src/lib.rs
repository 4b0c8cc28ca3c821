//! Raw HTTP to Kafka REST Proxy ingestion gateway.

pub mod config;
pub mod http;
pub mod kafka;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
