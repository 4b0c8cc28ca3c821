//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (peer address via ConnectInfo)
//!     → server.rs (Axum setup, ping route, gateway handler)
//!     → request.rs (capture RequestInfo: headers, client IP, body)
//!     → [kafka: encode envelope, POST to REST proxy]
//!     → response.rs (relay proxy response or structured error)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestExtractor, RequestInfo};
pub use response::{GatewayError, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
