//! Request capture.
//!
//! # Responsibilities
//! - Snapshot an inbound request into a [`RequestInfo`] record
//! - Resolve the client IP (forwarding headers, then peer address)
//! - Drain the body up to the configured limit
//!
//! # Design Decisions
//! - Extraction never fails: IP and body failures are recorded in `parse_errors`
//!   and the field falls back to its empty value
//! - Body capture is all-or-nothing; bytes read before a failure are discarded
//! - Headers are captured verbatim; redaction of excluded headers happens later

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Extensions, HeaderMap, Method, Request, Uri},
};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::security::client_ip::resolve_client_ip;
use crate::security::headers::{canonical_header_name, HeaderConfig, HeaderSet};

/// Captured headers: canonical name → values in arrival order.
pub type CapturedHeaders = IndexMap<String, Vec<String>>;

/// Snapshot of one inbound HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub headers: CapturedHeaders,
    /// Resolved client IP, empty when resolution failed.
    pub ip: String,
    pub method: String,
    /// Gateway wall-clock time at capture.
    pub server_time: DateTime<Utc>,
    /// Request target (path and query) as received.
    pub url: String,
    /// Raw body, base64 encoded on the wire.
    #[serde(with = "base64_bytes")]
    pub body: Vec<u8>,
    /// Non-fatal capture errors, in the order they occurred.
    #[serde(default)]
    pub parse_errors: Vec<String>,
}

impl RequestInfo {
    /// Drop every captured header named in `excluded`.
    pub fn redact_headers(&mut self, excluded: &HeaderSet) {
        self.headers.retain(|name, _| !excluded.contains(name));
    }
}

/// Builds [`RequestInfo`] records from inbound requests.
#[derive(Debug, Clone)]
pub struct RequestExtractor {
    headers: Arc<HeaderConfig>,
    max_body_bytes: usize,
}

impl RequestExtractor {
    pub fn new(headers: Arc<HeaderConfig>, max_body_bytes: usize) -> Self {
        Self {
            headers,
            max_body_bytes,
        }
    }

    pub fn header_config(&self) -> &HeaderConfig {
        &self.headers
    }

    /// Capture a request, draining its body.
    ///
    /// The peer address is taken from the `ConnectInfo<SocketAddr>` extension; when it is
    /// missing the IP falls back to the forwarding headers alone.
    pub async fn extract(&self, request: Request<Body>) -> RequestInfo {
        let peer = peer_address(request.extensions());
        let (parts, body) = request.into_parts();
        let server_time = Utc::now();

        let body = axum::body::to_bytes(body, self.max_body_bytes)
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|e| format!("failed to read request body: {}", e));

        self.capture(
            &parts.method,
            &parts.uri,
            &parts.headers,
            &peer,
            server_time,
            body,
        )
    }

    /// Assemble a record from already-split request parts.
    ///
    /// `server_time` is taken when the request arrives, before its body is drained.
    pub fn capture(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        peer: &str,
        server_time: DateTime<Utc>,
        body: Result<Vec<u8>, String>,
    ) -> RequestInfo {
        let mut parse_errors = Vec::new();

        let captured = capture_headers(headers);

        let ip = match resolve_client_ip(headers, &self.headers.ip_forwarding, peer) {
            Ok(ip) => ip,
            Err(e) => {
                parse_errors.push(e.to_string());
                String::new()
            }
        };

        let body = match body {
            Ok(bytes) => bytes,
            Err(e) => {
                parse_errors.push(e);
                Vec::new()
            }
        };

        RequestInfo {
            headers: captured,
            ip,
            method: method.as_str().to_string(),
            server_time,
            url: uri.to_string(),
            body,
            parse_errors,
        }
    }
}

/// Copy every header, grouping repeated names and keeping value order.
pub fn capture_headers(headers: &HeaderMap) -> CapturedHeaders {
    headers
        .keys()
        .map(|name| {
            let values = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect();
            (canonical_header_name(name.as_str()), values)
        })
        .collect()
}

/// Transport peer address as `host:port`, or an empty string when unknown.
pub fn peer_address(extensions: &Extensions) -> String {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default()
}

mod base64_bytes {
    use base64::prelude::{Engine as _, BASE64_STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64_STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64_STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
