//! Response handling.
//!
//! # Responsibilities
//! - Relay the REST proxy's status, headers and body to the caller
//! - Map gateway failures to structured JSON error responses
//!
//! # Design Decisions
//! - Hop-by-hop headers are stripped because the relayed body is re-framed
//! - Error bodies follow the REST proxy shape: `{"error_code": .., "message": ..}`

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kafka::{CodecError, ForwardError, ProxyResponse};

/// Content type of gateway error bodies.
pub const ERROR_CONTENT_TYPE: &str = "application/vnd.kafka.v2+json";

/// Request ID header attached to relayed responses.
pub const X_REQUEST_ID: &str = "x-request-id";

const HOP_BY_HOP: [HeaderName; 5] = [
    header::CONNECTION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Per-request failures surfaced to the caller.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Encoding(#[from] CodecError),

    #[error(transparent)]
    Forward(#[from] ForwardError),

    #[error("request not completed within {0:?}")]
    Elapsed(Duration),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Forward(ForwardError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Forward(ForwardError::Build(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Forward(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Elapsed(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Machine-readable code, REST proxy style (status followed by a two-digit detail).
    pub fn error_code(&self) -> u32 {
        match self {
            GatewayError::Encoding(_) => 50001,
            GatewayError::Forward(ForwardError::Build(_)) => 50002,
            GatewayError::Forward(ForwardError::Upstream(_)) => 50201,
            GatewayError::Forward(ForwardError::ReadBody(_)) => 50202,
            GatewayError::Forward(ForwardError::Timeout(_)) => 50401,
            GatewayError::Elapsed(_) => 50402,
        }
    }

    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            GatewayError::Encoding(_) => "encode",
            GatewayError::Forward(ForwardError::Build(_)) => "build",
            GatewayError::Forward(ForwardError::Upstream(_)) => "upstream",
            GatewayError::Forward(ForwardError::ReadBody(_)) => "read_body",
            GatewayError::Forward(ForwardError::Timeout(_)) => "timeout",
            GatewayError::Elapsed(_) => "request_timeout",
        }
    }
}

/// JSON body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_code: u32,
    pub message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error_code: self.error_code(),
            message: format!("raw-kafka-gateway: {}", self),
        };
        let content = serde_json::to_string_pretty(&body).unwrap_or_else(|_| {
            r#"{"error_code": 50000, "message": "raw-kafka-gateway: internal server error"}"#
                .to_string()
        });

        (
            self.status_code(),
            [(header::CONTENT_TYPE, HeaderValue::from_static(ERROR_CONTENT_TYPE))],
            content,
        )
            .into_response()
    }
}

/// Turn a buffered proxy response into the response sent to the caller.
pub fn relay(proxy: ProxyResponse, request_id: &str) -> Response {
    let ProxyResponse { mut parts, body } = proxy;

    for name in HOP_BY_HOP.iter() {
        parts.headers.remove(name);
    }
    parts.headers.remove("keep-alive");
    parts.headers.remove("proxy-connection");

    if !parts.headers.contains_key(X_REQUEST_ID) {
        if let Ok(value) = HeaderValue::from_str(request_id) {
            parts.headers.insert(X_REQUEST_ID, value);
        }
    }

    Response::from_parts(parts, Body::from(body))
}
