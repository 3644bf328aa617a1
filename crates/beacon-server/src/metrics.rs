//! Metrics collection and export for Beacon.
//!
//! Uses the `metrics` crate for instrumentation and exports
//! to Prometheus format.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Metric names.
pub mod names {
    pub const CONNECTIONS_TOTAL: &str = "beacon_connections_total";
    pub const CONNECTIONS_ACTIVE: &str = "beacon_connections_active";
    pub const ROOMS_ACTIVE: &str = "beacon_rooms_active";
    pub const SIGNALS_TOTAL: &str = "beacon_signals_total";
    pub const RELAY_DELIVERIES_TOTAL: &str = "beacon_relay_deliveries_total";
    pub const RELAY_DROPPED_TOTAL: &str = "beacon_relay_dropped_total";
    pub const STORE_ERRORS_TOTAL: &str = "beacon_store_errors_total";
    pub const TEARDOWNS_TOTAL: &str = "beacon_teardowns_total";
    pub const LATENCY_SECONDS: &str = "beacon_latency_seconds";
}

/// Initialize the metrics system.
pub fn init_metrics() {
    metrics::describe_counter!(
        names::CONNECTIONS_TOTAL,
        "Total number of live-channel connections since server start"
    );
    metrics::describe_gauge!(
        names::CONNECTIONS_ACTIVE,
        "Current number of live-channel connections"
    );
    metrics::describe_gauge!(names::ROOMS_ACTIVE, "Current number of registered rooms");
    metrics::describe_counter!(
        names::SIGNALS_TOTAL,
        "Total signaling submissions by kind and delivery path"
    );
    metrics::describe_counter!(
        names::RELAY_DELIVERIES_TOTAL,
        "Total push-path deliveries to recipients"
    );
    metrics::describe_counter!(
        names::RELAY_DROPPED_TOTAL,
        "Push-path submissions that reached no recipient"
    );
    metrics::describe_counter!(
        names::STORE_ERRORS_TOTAL,
        "Durable-store operations that failed"
    );
    metrics::describe_counter!(names::TEARDOWNS_TOTAL, "Total room teardowns");
    metrics::describe_histogram!(
        names::LATENCY_SECONDS,
        "Frame handling latency in seconds"
    );

    info!("Metrics initialized");
}

/// Start the Prometheus metrics server.
///
/// # Errors
///
/// Returns an error if the server cannot be started.
pub fn start_metrics_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Record a new live-channel connection.
pub fn record_connection() {
    counter!(names::CONNECTIONS_TOTAL).increment(1);
    gauge!(names::CONNECTIONS_ACTIVE).increment(1.0);
}

/// Record a disconnection.
pub fn record_disconnection() {
    gauge!(names::CONNECTIONS_ACTIVE).decrement(1.0);
}

/// Record a signaling submission.
pub fn record_signal(kind: &'static str, path: &'static str) {
    counter!(names::SIGNALS_TOTAL, "kind" => kind, "path" => path).increment(1);
}

/// Record a push-path fan-out result.
pub fn record_relay_result(recipients: usize) {
    if recipients == 0 {
        counter!(names::RELAY_DROPPED_TOTAL).increment(1);
    } else {
        counter!(names::RELAY_DELIVERIES_TOTAL).increment(recipients as u64);
    }
}

/// Record a failed store operation.
pub fn record_store_error() {
    counter!(names::STORE_ERRORS_TOTAL).increment(1);
}

/// Record a room teardown.
pub fn record_teardown() {
    counter!(names::TEARDOWNS_TOTAL).increment(1);
}

/// Record frame handling latency.
pub fn record_latency(seconds: f64) {
    histogram!(names::LATENCY_SECONDS).record(seconds);
}

/// Update the active room count.
pub fn set_rooms_active(count: usize) {
    gauge!(names::ROOMS_ACTIVE).set(count as f64);
}

/// Metrics guard that records disconnection on drop.
pub struct ConnectionMetricsGuard;

impl ConnectionMetricsGuard {
    /// Create a new metrics guard, recording a connection.
    #[must_use]
    pub fn new() -> Self {
        record_connection();
        Self
    }
}

impl Default for ConnectionMetricsGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConnectionMetricsGuard {
    fn drop(&mut self) {
        record_disconnection();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_guard() {
        // Just test that it doesn't panic
        let _guard = ConnectionMetricsGuard::new();
    }
}
