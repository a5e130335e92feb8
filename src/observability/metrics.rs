//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by sub-action and outcome
//! - `relay_request_duration_seconds` (histogram): handling latency
//! - `relay_action_requests_written_total` (counter): published request envelopes
//! - `relay_action_responses_consumed_total` (counter): responses by disposition
//! - `relay_allow_list_reloads_total` (counter): allow-list swaps
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with its own scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics recorder"),
    }
}

/// Record a handled request.
pub fn record_request(sub_action: &'static str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "relay_requests_total",
        "sub_action" => sub_action,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("relay_request_duration_seconds", "sub_action" => sub_action)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_request_written() {
    metrics::counter!("relay_action_requests_written_total").increment(1);
}

pub fn record_response_consumed(disposition: &'static str) {
    metrics::counter!(
        "relay_action_responses_consumed_total",
        "disposition" => disposition
    )
    .increment(1);
}

pub fn record_allow_list_reload() {
    metrics::counter!("relay_allow_list_reloads_total").increment(1);
}
