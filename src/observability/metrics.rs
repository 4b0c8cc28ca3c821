//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method and relayed status
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency by method
//! - `gateway_capture_errors_total` (counter): non-fatal capture errors
//! - `gateway_forward_failures_total` (counter): encode/forward failures by reason

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("gateway_requests_total", "Requests handled by the gateway");
    describe_histogram!(
        "gateway_request_duration_seconds",
        "Time from capture to relayed response"
    );
    describe_counter!(
        "gateway_capture_errors_total",
        "Non-fatal errors recorded while capturing requests"
    );
    describe_counter!(
        "gateway_forward_failures_total",
        "Requests answered with a gateway error"
    );

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_owned(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "method" => method.to_owned())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_capture_errors(count: usize) {
    if count > 0 {
        counter!("gateway_capture_errors_total").increment(count as u64);
    }
}

pub fn record_forward_failure(reason: &'static str) {
    counter!("gateway_forward_failures_total", "reason" => reason).increment(1);
}
