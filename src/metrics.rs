//! Prometheus metrics for hits and store latency.
//!
//! This module provides metrics for:
//! - Hits recorded and failed
//! - Store connect and command latency
//! - HTTP request latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::{debug, info};

// === Metric Name Constants ===

/// Hits recorded counter metric name.
pub const METRIC_HITS: &str = "hits_total";
/// Failed requests counter metric name.
pub const METRIC_HIT_FAILURES: &str = "hit_failures_total";
/// Store connect latency metric name.
pub const METRIC_STORE_CONNECT_LATENCY: &str = "store_connect_latency_ms";
/// Store command latency metric name.
pub const METRIC_STORE_COMMAND_LATENCY: &str = "store_command_latency_ms";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_counter!(METRIC_HITS, "Total number of hits recorded");
    describe_counter!(
        METRIC_HIT_FAILURES,
        "Total number of requests that ended in a server error"
    );
    describe_histogram!(
        METRIC_STORE_CONNECT_LATENCY,
        "Store connection setup latency in milliseconds"
    );
    describe_histogram!(
        METRIC_STORE_COMMAND_LATENCY,
        "Store command round-trip latency in milliseconds"
    );
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus exporter on its own listener.
///
/// Must be called from within a Tokio runtime.
pub fn install_exporter(port: u16) -> Result<(), BuildError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, method: &str, status: u16) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(latency_ms);
}

/// Increment hits counter.
pub fn inc_hits() {
    counter!(METRIC_HITS).increment(1);
}

/// Increment failures counter.
pub fn inc_hit_failures() {
    counter!(METRIC_HIT_FAILURES).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for store connection setup.
pub fn timer_store_connect() -> LatencyTimer {
    LatencyTimer::new(METRIC_STORE_CONNECT_LATENCY)
}

/// Create a latency timer for a store command.
pub fn timer_store_command() -> LatencyTimer {
    LatencyTimer::new(METRIC_STORE_COMMAND_LATENCY)
}
