//! Metrics collection and exposition.
//!
//! # Metrics
//! - `tryon_generate_requests_total` (counter): generate requests by mode, outcome
//! - `tryon_generate_duration_seconds` (histogram): end-to-end latency by mode
//! - `tryon_downstream_duration_seconds` (histogram): model call latency by outcome
//! - `tryon_upload_bytes` (histogram): stored upload sizes by field
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::config::Mode;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_generate(mode: Mode, outcome: &'static str, start: Instant) {
    counter!("tryon_generate_requests_total", "mode" => mode.as_str(), "outcome" => outcome).increment(1);
    histogram!("tryon_generate_duration_seconds", "mode" => mode.as_str()).record(start.elapsed().as_secs_f64());
}

pub fn record_downstream(outcome: &'static str, start: Instant) {
    histogram!("tryon_downstream_duration_seconds", "outcome" => outcome).record(start.elapsed().as_secs_f64());
}

pub fn record_upload(field: &'static str, bytes: u64) {
    histogram!("tryon_upload_bytes", "field" => field).record(bytes as f64);
}
