//! Metrics collection.
//!
//! # Metrics
//! - `pact_local_total` (counter): local executions by chain, outcome
//! - `pact_submit_total` (counter): submitted transactions by chain
//! - `pact_listen_total` (counter): listened results by chain, status
//! - `pact_listen_duration_seconds` (histogram): time from listen to result
//! - `pact_signature_collections_total` (counter): multi-authority collections by outcome

use std::time::Duration;

use crate::command::types::ChainId;

pub fn record_local(chain_id: &ChainId, success: bool) {
    ::metrics::counter!(
        "pact_local_total",
        "chain" => chain_id.to_string(),
        "outcome" => outcome(success)
    )
    .increment(1);
}

pub fn record_submit(chain_id: &ChainId) {
    ::metrics::counter!("pact_submit_total", "chain" => chain_id.to_string()).increment(1);
}

pub fn record_listen(chain_id: &ChainId, success: bool, elapsed: Duration) {
    ::metrics::counter!(
        "pact_listen_total",
        "chain" => chain_id.to_string(),
        "status" => outcome(success)
    )
    .increment(1);
    ::metrics::histogram!("pact_listen_duration_seconds", "chain" => chain_id.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_signature_collection(success: bool) {
    ::metrics::counter!("pact_signature_collections_total", "outcome" => outcome(success))
        .increment(1);
}

fn outcome(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}
