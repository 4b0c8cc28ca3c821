//! Trust-boundary handling for inbound requests.
//!
//! # Data Flow
//! ```text
//! configuration (env / flags / TOML)
//!     → headers.rs (canonical HeaderSet values, HeaderConfig)
//!     → shared via Arc to every request handler
//!
//! inbound request
//!     → client_ip.rs (forwarding headers in priority order, then peer address)
//! ```
//!
//! # Design Decisions
//! - Forwarding headers are trusted; only syntactic IP validation is applied
//! - Excluded headers are redacted by the gateway handler before encoding

pub mod client_ip;
pub mod headers;

pub use client_ip::{resolve_client_ip, ClientIpError};
pub use headers::{HeaderConfig, HeaderNameError, HeaderSet};
