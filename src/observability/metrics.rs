//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (requests, latency, upstream outcomes, fallbacks)
//! - Expose a Prometheus-compatible scrape endpoint when enabled
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, route
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency
//! - `proxy_upstream_fetches_total` (counter): store calls by outcome
//! - `proxy_upstream_fetch_duration_seconds` (histogram): store call latency
//! - `proxy_spa_fallbacks_total` (counter): fallbacks by result
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Label values are bounded: route names and error categories only

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed client request.
pub fn record_request(method: &str, status: u16, route: &'static str, started: Instant) {
    let method = method.to_string();
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.clone(),
        "status" => status.to_string(),
        "route" => route
    )
    .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "method" => method, "route" => route)
        .record(started.elapsed().as_secs_f64());
}

/// Record one upstream fetch. `outcome` is `ok` or a failure category.
pub fn record_upstream_fetch(outcome: &'static str, elapsed: Duration) {
    metrics::counter!("proxy_upstream_fetches_total", "outcome" => outcome).increment(1);
    metrics::histogram!("proxy_upstream_fetch_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record the result of a fallback decision: `served`, `failed` or `skipped`.
pub fn record_spa_fallback(result: &'static str) {
    metrics::counter!("proxy_spa_fallbacks_total", "result" => result).increment(1);
}
