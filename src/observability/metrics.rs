//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ola_outbound_requests_total` (counter): downstream calls by service, outcome
//! - `ola_outbound_request_duration_seconds` (histogram): downstream call latency
//! - `ola_circuit_state` (gauge): 0=closed, 1=open, 2=half-open
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, which keeps tests free of global setup
//! - Prometheus exposition via its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::CircuitState;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record the outcome of one downstream call.
pub fn record_outbound(service: &str, outcome: &'static str, start: Instant) {
    counter!(
        "ola_outbound_requests_total",
        "service" => service.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "ola_outbound_request_duration_seconds",
        "service" => service.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_circuit_state(service: &str, state: CircuitState) {
    gauge!("ola_circuit_state", "service" => service.to_string()).set(state as u8 as f64);
}
