//! Kafka REST Proxy forwarding.
//!
//! # Responsibilities
//! - POST an encoded envelope to the configured REST endpoint
//! - Bound each call with the upstream timeout
//! - Buffer the proxy's response so it can be logged and relayed
//!
//! # Design Decisions
//! - One attempt per request: no retries, batching or queueing
//! - Plain HTTP only (hyper-util `HttpConnector`)

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{header::CONTENT_TYPE, response::Parts, HeaderValue, Method, Request, Uri},
};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

/// Content type of Kafka REST Proxy Avro produce requests.
pub const KAFKA_AVRO_CONTENT_TYPE: &str = "application/vnd.kafka.avro.v2+json";

/// Upper bound on a buffered REST proxy response.
const MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// Errors that can occur while forwarding to the REST proxy.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to build upstream request: {0}")]
    Build(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to read upstream response: {0}")]
    ReadBody(#[source] axum::Error),
}

/// A fully buffered REST proxy response.
#[derive(Debug)]
pub struct ProxyResponse {
    pub parts: Parts,
    pub body: Bytes,
}

/// Client for the Kafka REST Proxy produce endpoint.
#[derive(Debug, Clone)]
pub struct RestProxyClient {
    client: Client<HttpConnector, Body>,
    endpoint: Uri,
    timeout: Duration,
}

impl RestProxyClient {
    pub fn new(endpoint: Uri, timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            endpoint,
            timeout,
        }
    }

    /// Send one encoded envelope and buffer the response.
    pub async fn forward(&self, envelope: Vec<u8>) -> Result<ProxyResponse, ForwardError> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static(KAFKA_AVRO_CONTENT_TYPE))
            .body(Body::from(envelope))?;

        let exchange = async {
            let response = self.client.request(request).await?;
            let (parts, body) = response.into_parts();
            let body = read_body(body).await?;
            Ok::<_, ForwardError>(ProxyResponse { parts, body })
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ForwardError::Timeout(self.timeout))?
    }
}

async fn read_body(body: Incoming) -> Result<Bytes, ForwardError> {
    axum::body::to_bytes(Body::new(body), MAX_RESPONSE_BYTES)
        .await
        .map_err(ForwardError::ReadBody)
}
