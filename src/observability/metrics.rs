//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_proxy_requests_total` (counter): proxied requests by application, outcome, status
//! - `gateway_proxy_request_duration_seconds` (histogram): proxied request latency
//! - `gateway_deployments_total` (counter): successful deploys
//! - `gateway_evictions_total` (counter): applications removed by the eviction sweep
//! - `gateway_deployed_applications` (gauge): current registry size

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// `application` must come from a bounded set: a deployed id or a fixed
/// placeholder, never raw request input.
pub fn record_proxy_request(application: &str, outcome: &'static str, status: u16, elapsed: Duration) {
    let labels = [
        ("application", application.to_string()),
        ("outcome", outcome.to_string()),
        ("status", status.to_string()),
    ];
    counter!("gateway_proxy_requests_total", &labels).increment(1);
    histogram!("gateway_proxy_request_duration_seconds", "application" => application.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_deployment(application: &str) {
    counter!("gateway_deployments_total", "application" => application.to_string()).increment(1);
}

pub fn record_eviction(application: &str) {
    counter!("gateway_evictions_total", "application" => application.to_string()).increment(1);
}

pub fn set_deployed_applications(count: usize) {
    gauge!("gateway_deployed_applications").set(count as f64);
}
