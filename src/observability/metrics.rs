//! Metrics collection and exposition.
//!
//! # Metrics
//! - `closer_hooks_total` (counter): hook executions by hook, outcome
//! - `closer_hook_duration_seconds` (histogram): time spent in each hook
//! - `closer_hooks_pending` (gauge): hooks the shutdown run still waits for
//! - `closer_shutdown_total` (counter): shutdown runs by outcome
//! - `closer_shutdown_duration_seconds` (histogram): wall time of the run
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus exporter is optional and off by default

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_hook(hook: &str, outcome: &'static str, duration: Duration) {
    metrics::counter!("closer_hooks_total", "hook" => hook.to_string(), "outcome" => outcome)
        .increment(1);
    metrics::histogram!("closer_hook_duration_seconds", "hook" => hook.to_string())
        .record(duration.as_secs_f64());
}

pub fn set_hooks_pending(pending: usize) {
    metrics::gauge!("closer_hooks_pending").set(pending as f64);
}

pub fn record_shutdown(outcome: &'static str, duration: Duration) {
    metrics::counter!("closer_shutdown_total", "outcome" => outcome).increment(1);
    metrics::histogram!("closer_shutdown_duration_seconds").record(duration.as_secs_f64());
}
