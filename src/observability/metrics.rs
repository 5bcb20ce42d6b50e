//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_decisions_total` (counter): gate outcomes by `outcome`
//! - `gate_rate_limited_total` (counter): 429s by `route`
//! - `gate_auth_failures_total` (counter): rejected tokens by `kind`
//! - `gate_reset_events_total` (counter): reset ledger events by `event`
//! - `gate_sweep_removed_total` (counter): housekeeping removals by `kind`
//! - `gate_rate_limit_counters` (gauge): live rate-limit counters
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decision(outcome: &'static str) {
    counter!("gate_decisions_total", "outcome" => outcome).increment(1);
}

pub fn record_rate_limited(route: &str) {
    counter!("gate_rate_limited_total", "route" => route.to_string()).increment(1);
}

pub fn record_auth_failure(kind: &'static str) {
    counter!("gate_auth_failures_total", "kind" => kind).increment(1);
}

pub fn record_reset_event(event: &'static str) {
    counter!("gate_reset_events_total", "event" => event).increment(1);
}

pub fn record_sweep(kind: &'static str, removed: usize) {
    counter!("gate_sweep_removed_total", "kind" => kind).increment(removed as u64);
}

pub fn record_rate_limit_counters(live: usize) {
    gauge!("gate_rate_limit_counters").set(live as f64);
}
