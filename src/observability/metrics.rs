//! Metrics collection and exposition.
//!
//! # Metrics
//! - `agent_cycles_total` (counter): cycles by `outcome`
//! - `agent_cycle_duration_seconds` (histogram): wall time per cycle
//! - `agent_bootstrap_total` (counter): bootstrap attempts by `result`
//! - `agent_remote_requests_total` (counter): authority calls by `operation`, `result`
//!
//! Recording is a no-op until [`init_metrics`] installs an exporter.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_cycle(outcome: &'static str, elapsed: Duration) {
    metrics::counter!("agent_cycles_total", "outcome" => outcome).increment(1);
    metrics::histogram!("agent_cycle_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_bootstrap(result: &'static str) {
    metrics::counter!("agent_bootstrap_total", "result" => result).increment(1);
}

pub fn record_remote_request(operation: &'static str, result: &'static str) {
    metrics::counter!(
        "agent_remote_requests_total",
        "operation" => operation,
        "result" => result
    )
    .increment(1);
}
