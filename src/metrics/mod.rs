//! Prometheus metrics for the push sync core.
//!
//! Counters cover the three state machines this crate runs on page load:
//! - Subscription/permission change detection
//! - Retroactive click replay (replayed vs. discarded stale)
//! - Welcome notification dispatch

use lazy_static::lazy_static;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "ara";

lazy_static! {
    /// Subscription state transitions detected and published
    pub static ref SUBSCRIPTION_CHANGES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_push_subscription_changes_total", METRIC_PREFIX),
        "Subscription state transitions detected and published"
    ).unwrap();

    /// Notification permission transitions persisted and published
    pub static ref PERMISSION_CHANGES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_push_permission_changes_total", METRIC_PREFIX),
        "Notification permission transitions persisted and published"
    ).unwrap();

    /// Stored notification clicks replayed to the page
    pub static ref CLICKS_REPLAYED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_push_clicks_replayed_total", METRIC_PREFIX),
        "Stored notification clicks replayed to the page"
    ).unwrap();

    /// Stored notification clicks discarded as stale
    pub static ref CLICKS_STALE_TOTAL: IntCounter = register_int_counter!(
        format!("{}_push_clicks_stale_total", METRIC_PREFIX),
        "Stored notification clicks discarded past the freshness window"
    ).unwrap();

    /// Welcome notifications sent through the outbound API
    pub static ref WELCOME_SENT_TOTAL: IntCounter = register_int_counter!(
        format!("{}_push_welcome_sent_total", METRIC_PREFIX),
        "Welcome notifications sent through the outbound API"
    ).unwrap();
}

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}
