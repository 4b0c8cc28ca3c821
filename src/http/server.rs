//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the ping and gateway handlers
//! - Wire up middleware (tracing) and bound each request by the request timeout
//! - Bind server to listener with connect info for peer addresses
//! - Capture, encode and forward every request to the Kafka REST Proxy
//! - Relay the proxy's response and record logs and metrics

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::validation::is_literal_route;
use crate::config::GatewayConfig;
use crate::http::request::RequestExtractor;
use crate::http::response::{relay, GatewayError, X_REQUEST_ID};
use crate::kafka::{KafkaCodec, RestProxyClient};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::security::headers::{HeaderConfig, HeaderNameError};

/// Errors building the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid REST endpoint {endpoint:?}: {source}")]
    RestEndpoint {
        endpoint: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },

    #[error("invalid ping path {0:?}: must start with '/' and contain no route parameters")]
    PingPath(String),

    #[error(transparent)]
    Headers(#[from] HeaderNameError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub extractor: RequestExtractor,
    pub codec: Arc<KafkaCodec>,
    pub rest: RestProxyClient,
    pub redact_excluded: bool,
    pub request_timeout: Duration,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server around a registered codec.
    pub fn new(config: GatewayConfig, codec: Arc<KafkaCodec>) -> Result<Self, ServerError> {
        let headers = Arc::new(HeaderConfig::from_lists(
            &config.headers.excluded,
            &config.headers.ip_forwarding,
        )?);
        tracing::debug!(
            excluded = ?headers.excluded.names().collect::<Vec<_>>(),
            ip_forwarding = ?headers.ip_forwarding.names().collect::<Vec<_>>(),
            "Header capture configured"
        );

        let endpoint: Uri =
            config
                .kafka
                .rest_endpoint
                .parse()
                .map_err(|source| ServerError::RestEndpoint {
                    endpoint: config.kafka.rest_endpoint.clone(),
                    source,
                })?;

        if !is_literal_route(&config.listener.ping_path) {
            return Err(ServerError::PingPath(config.listener.ping_path.clone()));
        }

        let state = AppState {
            extractor: RequestExtractor::new(headers, config.limits.max_body_bytes),
            codec,
            rest: RestProxyClient::new(
                endpoint,
                Duration::from_secs(config.timeouts.upstream_secs),
            ),
            redact_excluded: config.headers.redact_excluded,
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route(&config.listener.ping_path, any(ping_handler))
            .fallback(gateway_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The configured router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            ping_path = %self.config.listener.ping_path,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn ping_handler() -> &'static str {
    "pong"
}

/// Bound the whole exchange by the request timeout.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().to_string();
    let url = request.uri().to_string();

    match tokio::time::timeout(
        state.request_timeout,
        forward_request(&state, request, &request_id, start),
    )
    .await
    {
        Ok(response) => response,
        Err(_) => {
            let e = GatewayError::Elapsed(state.request_timeout);
            tracing::error!(
                request_id = %request_id,
                method = %method,
                url = %url,
                elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                error = %e,
                "Request timed out"
            );
            metrics::record_forward_failure(e.reason());
            metrics::record_request(&method, e.status_code().as_u16(), start);
            error_response(e, &request_id)
        }
    }
}

/// Capture the request, forward it to the REST proxy and relay the answer.
async fn forward_request(
    state: &AppState,
    request: Request<Body>,
    request_id: &str,
    start: Instant,
) -> Response {
    let mut info = state.extractor.extract(request).await;

    metrics::record_capture_errors(info.parse_errors.len());
    if !info.parse_errors.is_empty() {
        tracing::warn!(
            request_id = %request_id,
            errors = ?info.parse_errors,
            "Request captured with errors"
        );
    }

    if state.redact_excluded {
        info.redact_headers(&state.extractor.header_config().excluded);
    }

    let forwarded = async {
        let envelope = state.codec.encode(&info)?;
        Ok::<_, GatewayError>(state.rest.forward(envelope).await?)
    }
    .await;

    let elapsed_ms = || start.elapsed().as_secs_f64() * 1000.0;

    match forwarded {
        Ok(proxy) => {
            let status = proxy.parts.status;
            let body = String::from_utf8_lossy(&proxy.body);
            if status == StatusCode::OK {
                tracing::info!(
                    request_id = %request_id,
                    ip = %info.ip,
                    method = %info.method,
                    url = %info.url,
                    status = status.as_u16(),
                    elapsed_ms = elapsed_ms(),
                    response = %body,
                    "Request forwarded"
                );
            } else {
                tracing::warn!(
                    request_id = %request_id,
                    ip = %info.ip,
                    method = %info.method,
                    url = %info.url,
                    status = status.as_u16(),
                    elapsed_ms = elapsed_ms(),
                    response = %body,
                    "Bad response from Kafka REST"
                );
            }
            metrics::record_request(&info.method, status.as_u16(), start);
            relay(proxy, request_id)
        }
        Err(e) => {
            let status = e.status_code();
            tracing::error!(
                request_id = %request_id,
                ip = %info.ip,
                method = %info.method,
                url = %info.url,
                status = status.as_u16(),
                elapsed_ms = elapsed_ms(),
                error = %e,
                "Failed to forward request"
            );
            metrics::record_forward_failure(e.reason());
            metrics::record_request(&info.method, status.as_u16(), start);
            error_response(e, request_id)
        }
    }
}

fn error_response(e: GatewayError, request_id: &str) -> Response {
    let mut response = e.into_response();
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}
