//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, surface
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_blocked_total` (counter): lockdown 404s
//! - `gateway_redirects_total` (counter): canonical redirects
//! - `gateway_rewritten_urls_total` (counter): self URLs moved onto the inbound host
//!
//! Recording is a no-op until a recorder is installed, so tests and library
//! users pay nothing unless they call [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, surface: &'static str, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "surface" => surface
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "surface" => surface)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_blocked() {
    metrics::counter!("gateway_blocked_total").increment(1);
}

pub fn record_redirect() {
    metrics::counter!("gateway_redirects_total").increment(1);
}

pub fn record_rewrites(count: usize) {
    if count > 0 {
        metrics::counter!("gateway_rewritten_urls_total").increment(count as u64);
    }
}
