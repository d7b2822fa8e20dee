//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by relay and status
//! - `relay_request_duration_seconds` (histogram): latency by relay
//! - `relay_upstream_failures_total` (counter): upscale failures by step
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(relay: &'static str, status: u16, start: Instant) {
    counter!("relay_requests_total", "relay" => relay, "status" => status.to_string()).increment(1);
    histogram!("relay_request_duration_seconds", "relay" => relay)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_failure(stage: &'static str) {
    counter!("relay_upstream_failures_total", "stage" => stage).increment(1);
}
