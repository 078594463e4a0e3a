//! Capture metrics collection.
//!
//! Counters and a latency histogram for capture attempts. Without an
//! installed recorder these calls are no-ops.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Attempts that ran to an outcome, by outcome.
    pub const ATTEMPTS_TOTAL: &str = "facecap_attempts_total";

    /// Rejected attempts, by reason.
    pub const SKIPPED_TOTAL: &str = "facecap_skipped_total";

    /// Attempt duration in seconds, by outcome.
    pub const ATTEMPT_SECONDS: &str = "facecap_attempt_seconds";
}

/// Record a finished attempt.
pub fn record_attempt(outcome: &'static str, latency_ms: f64) {
    counter!(names::ATTEMPTS_TOTAL, "outcome" => outcome).increment(1);
    histogram!(names::ATTEMPT_SECONDS, "outcome" => outcome).record(latency_ms / 1000.0);
}

/// Record a rejected attempt.
pub fn record_skip(reason: &'static str) {
    counter!(names::SKIPPED_TOTAL, "reason" => reason).increment(1);
}
