//! Shared capture state for one screen activation.
//!
//! The pipeline owns the state and is the only writer. The frame analyzer
//! holds a clone of the same handle and only reads it for its eligibility
//! gate. The capturing flag is claimed under the lock together with the
//! throttle check, so two frames racing into the pipeline can never both
//! observe it as clear.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

/// Why an attempt was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No active camera session.
    CameraNotReady,
    /// Another attempt is in flight.
    AlreadyCapturing,
    /// Too soon after the previous attempt.
    Throttled { remaining: Duration },
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::CameraNotReady => "camera_not_ready",
            SkipReason::AlreadyCapturing => "already_capturing",
            SkipReason::Throttled { .. } => "throttled",
        }
    }
}

/// Snapshot of the capture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureState {
    /// An attempt is in flight.
    pub is_capturing: bool,
    /// When the last attempt was accepted.
    pub last_capture: Option<Instant>,
    /// One-shot latch: a capture already succeeded in this session.
    pub completed: bool,
}

/// Cloneable handle to the session's capture state.
#[derive(Debug, Clone, Default)]
pub struct CaptureSession {
    state: Arc<Mutex<CaptureState>>,
}

impl CaptureSession {
    /// Start a fresh session.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CaptureState> {
        // State stays consistent under every critical section, so a poisoned
        // lock is still safe to use.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> CaptureState {
        *self.lock()
    }

    pub fn is_capturing(&self) -> bool {
        self.lock().is_capturing
    }

    pub fn is_completed(&self) -> bool {
        self.lock().completed
    }

    pub fn last_capture(&self) -> Option<Instant> {
        self.lock().last_capture
    }

    /// Re-arm the session when the screen is activated again.
    ///
    /// Clears the throttle timestamp and the one-shot latch. An attempt still
    /// in flight keeps the capturing flag until it finishes.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.last_capture = None;
        state.completed = false;
    }

    /// Claim the capturing flag if no attempt is running and the throttle
    /// window has passed. Records `now` as the last capture time on success.
    pub(crate) fn try_begin(
        &self,
        now: Instant,
        throttle: Duration,
    ) -> Result<CaptureGuard, SkipReason> {
        let mut state = self.lock();

        if state.is_capturing {
            return Err(SkipReason::AlreadyCapturing);
        }

        if let Some(last) = state.last_capture {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < throttle {
                return Err(SkipReason::Throttled {
                    remaining: throttle - elapsed,
                });
            }
        }

        state.is_capturing = true;
        state.last_capture = Some(now);

        Ok(CaptureGuard {
            session: self.clone(),
        })
    }
}

/// Proof of an in-flight attempt. Dropping it clears the capturing flag.
#[derive(Debug)]
pub struct CaptureGuard {
    session: CaptureSession,
}

impl CaptureGuard {
    /// Latch the session as having produced its one successful capture.
    pub(crate) fn mark_completed(&self) {
        self.session.lock().completed = true;
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.session.lock().is_capturing = false;
    }
}
