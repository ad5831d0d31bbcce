//! # Vault Plugin Metrics
//!
//! Prometheus metrics for monitoring reporting rounds.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! vault-plugin = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `vault_item_errors_total` - Failed request items (by request type and error class)
//! - `vault_observations_built_total` - Observations produced by this node
//! - `vault_outcomes_emitted_total` - Outcomes that reached quorum
//! - `vault_quorum_misses_total` - Request ids dropped for lack of agreement
//! - `vault_reports_generated_total` - Reports handed to the host for signing

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Failed request items, labeled by request type and error class
    pub static ref ITEM_ERRORS: IntCounterVec = register_int_counter_vec!(
        "vault_item_errors_total",
        "Total number of request items that failed",
        &["request_type", "class"]
    )
    .expect("Failed to create ITEM_ERRORS metric");

    /// Observations produced by this node
    pub static ref OBSERVATIONS_BUILT: IntCounter = register_int_counter!(
        "vault_observations_built_total",
        "Total number of observations produced"
    )
    .expect("Failed to create OBSERVATIONS_BUILT metric");

    /// Outcomes that reached quorum
    pub static ref OUTCOMES_EMITTED: IntCounter = register_int_counter!(
        "vault_outcomes_emitted_total",
        "Total number of outcomes emitted by state transition"
    )
    .expect("Failed to create OUTCOMES_EMITTED metric");

    /// Request ids without 2f+1 identical observations
    pub static ref QUORUM_MISSES: IntCounter = register_int_counter!(
        "vault_quorum_misses_total",
        "Total number of request ids dropped for lack of agreement"
    )
    .expect("Failed to create QUORUM_MISSES metric");

    /// Reports produced for signing
    pub static ref REPORTS_GENERATED: IntCounter = register_int_counter!(
        "vault_reports_generated_total",
        "Total number of reports generated"
    )
    .expect("Failed to create REPORTS_GENERATED metric");
}

/// Record a failed request item
#[cfg(feature = "metrics")]
pub fn record_item_error(request_type: &str, user: bool) {
    let class = if user { "user" } else { "internal" };
    ITEM_ERRORS.with_label_values(&[request_type, class]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_observations_built(count: usize) {
    OBSERVATIONS_BUILT.inc_by(count as u64);
}

#[cfg(feature = "metrics")]
pub fn record_outcomes_emitted(count: usize) {
    OUTCOMES_EMITTED.inc_by(count as u64);
}

#[cfg(feature = "metrics")]
pub fn record_quorum_miss() {
    QUORUM_MISSES.inc();
}

#[cfg(feature = "metrics")]
pub fn record_reports_generated(count: usize) {
    REPORTS_GENERATED.inc_by(count as u64);
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_item_error(_request_type: &str, _user: bool) {}

#[cfg(not(feature = "metrics"))]
pub fn record_observations_built(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_outcomes_emitted(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_quorum_miss() {}

#[cfg(not(feature = "metrics"))]
pub fn record_reports_generated(_count: usize) {}
