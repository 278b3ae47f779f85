//! # Session Metrics
//!
//! Prometheus counters for connection attempts, dispatched actions and
//! read-state refreshes.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! wallet-session = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `wallet_session_connect_attempts_total` - Connection attempts (by outcome)
//! - `wallet_session_actions_total` - Dispatched actions (by kind and outcome)
//! - `wallet_session_refresh_failures_total` - Failed field queries (by field)
//! - `wallet_session_stale_read_warnings_total` - Confirmed actions with a failed refresh

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Connection attempts, labeled by outcome
    pub static ref CONNECT_ATTEMPTS: IntCounterVec = register_int_counter_vec!(
        "wallet_session_connect_attempts_total",
        "Total number of connection attempts",
        &["outcome"]
    )
    .expect("Failed to create CONNECT_ATTEMPTS metric");

    /// Dispatched actions, labeled by kind and outcome
    pub static ref ACTIONS: IntCounterVec = register_int_counter_vec!(
        "wallet_session_actions_total",
        "Total number of dispatched actions",
        &["kind", "outcome"]
    )
    .expect("Failed to create ACTIONS metric");

    /// Failed field queries, labeled by field
    pub static ref REFRESH_FAILURES: IntCounterVec = register_int_counter_vec!(
        "wallet_session_refresh_failures_total",
        "Total number of failed read-state queries",
        &["field"]
    )
    .expect("Failed to create REFRESH_FAILURES metric");

    /// Confirmed actions whose refresh failed
    pub static ref STALE_READ_WARNINGS: IntCounter = register_int_counter!(
        "wallet_session_stale_read_warnings_total",
        "Total number of confirmed actions reported with stale read state"
    )
    .expect("Failed to create STALE_READ_WARNINGS metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a connection attempt outcome
#[cfg(feature = "metrics")]
pub fn record_connect(outcome: &str) {
    CONNECT_ATTEMPTS.with_label_values(&[outcome]).inc();
}

/// Record an action outcome
#[cfg(feature = "metrics")]
pub fn record_action(kind: &str, outcome: &str) {
    ACTIONS.with_label_values(&[kind, outcome]).inc();
}

/// Record a failed field query
#[cfg(feature = "metrics")]
pub fn record_refresh_failure(field: &str) {
    REFRESH_FAILURES.with_label_values(&[field]).inc();
}

/// Record a stale-read warning
#[cfg(feature = "metrics")]
pub fn record_stale_read() {
    STALE_READ_WARNINGS.inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_connect(_outcome: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_action(_kind: &str, _outcome: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_refresh_failure(_field: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_stale_read() {}
