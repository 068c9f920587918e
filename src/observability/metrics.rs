//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): completion requests by status
//! - `relay_request_duration_seconds` (histogram): end-to-end latency
//! - `relay_upstream_duration_seconds` (histogram): upstream call latency
//! - `relay_rate_limited_total` (counter): requests rejected with 429
//! - `relay_notifications_total` (counter): notification outcomes
//!
//! Recording is a no-op until `init_metrics` installs the Prometheus recorder.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, start: Instant) {
    counter!("relay_requests_total", "status" => status.to_string()).increment(1);
    histogram!("relay_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_upstream(outcome: &'static str, start: Instant) {
    histogram!("relay_upstream_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    counter!("relay_rate_limited_total").increment(1);
}

pub fn record_notification(outcome: &'static str) {
    counter!("relay_notifications_total", "outcome" => outcome).increment(1);
}
