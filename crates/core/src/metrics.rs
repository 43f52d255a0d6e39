//! Metrics definitions for the facilitator.
//!
//! This module defines all metrics used throughout the facilitator.
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "batches_dispatched_total",
        "Total number of event batches handed to the dispatcher"
    );
    describe_counter!(
        "entities_persisted_total",
        "Total number of entities persisted by handlers"
    );
    describe_counter!(
        "handler_errors_total",
        "Total number of record-level handler failures"
    );
    describe_counter!(
        "stale_requests_discarded_total",
        "Total number of transfer-request occurrences dropped by the block-height tie-break"
    );
    describe_counter!(
        "subgraph_polls_total",
        "Total number of subgraph poll cycles"
    );
    describe_histogram!(
        "batch_dispatch_duration_seconds",
        "Time taken to dispatch one event batch in seconds"
    );
}

/// Record a dispatched batch.
///
/// # Arguments
/// * `chain` - The chain the batch came from ("origin" or "auxiliary")
pub fn record_batch_dispatched(chain: &str) {
    counter!("batches_dispatched_total", "chain" => chain.to_string()).increment(1);
}

/// Record entities persisted for one event type.
///
/// # Arguments
/// * `event_type` - The event-type key the records belonged to
/// * `count` - Number of entities persisted
pub fn record_entities_persisted(event_type: &str, count: u64) {
    counter!("entities_persisted_total", "event_type" => event_type.to_string()).increment(count);
}

/// Record a record-level handler failure.
///
/// # Arguments
/// * `event_type` - The event-type key whose record failed
pub fn record_handler_error(event_type: &str) {
    counter!("handler_errors_total", "event_type" => event_type.to_string()).increment(1);
}

/// Record a transfer-request occurrence discarded as stale.
pub fn record_stale_request_discarded() {
    counter!("stale_requests_discarded_total").increment(1);
}

/// Record one subgraph poll cycle.
///
/// # Arguments
/// * `chain` - The chain that was polled ("origin" or "auxiliary")
pub fn record_subgraph_poll(chain: &str) {
    counter!("subgraph_polls_total", "chain" => chain.to_string()).increment(1);
}

/// Record batch dispatch duration.
pub fn record_dispatch_duration(duration_secs: f64) {
    histogram!("batch_dispatch_duration_seconds").record(duration_secs);
}

/// A timer that automatically records dispatch duration when dropped.
pub struct DispatchTimer {
    start: Instant,
}

impl DispatchTimer {
    /// Start a new dispatch timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for DispatchTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DispatchTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_dispatch_duration(duration);
    }
}
