//! Structured capture logging utilities.
//!
//! Every accepted attempt gets its own logger carrying an attempt id, so the
//! lines of one capture can be told apart from the next one.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

/// Per-attempt logger with consistent structured fields.
#[derive(Debug, Clone)]
pub struct CaptureLogger {
    attempt_id: String,
}

impl Default for CaptureLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureLogger {
    /// Create a logger with a fresh attempt id.
    pub fn new() -> Self {
        Self {
            attempt_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(attempt_id = %self.attempt_id, "Capture started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(attempt_id = %self.attempt_id, "Capture progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(attempt_id = %self.attempt_id, "Capture warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(attempt_id = %self.attempt_id, "Capture failed: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(attempt_id = %self.attempt_id, "Capture completed: {}", message);
    }

    pub fn attempt_id(&self) -> &str {
        &self.attempt_id
    }

    /// Span covering the whole attempt.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("capture", attempt_id = %self.attempt_id)
    }
}
