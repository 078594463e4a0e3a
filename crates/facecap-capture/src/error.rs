//! Capture pipeline error types.

use facecap_media::{MediaError, MediaStage};
use facecap_models::CapturePhase;
use facecap_sink::SinkError;
use thiserror::Error;

pub type CaptureResult<T> = Result<T, CaptureError>;

/// Errors reported by the camera collaborator.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("Camera is busy")]
    Busy,

    #[error("Camera unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureErrorKind {
    /// Camera busy or denied. Nothing was acquired.
    Acquisition,
    /// Malformed bounds, photo size unreadable, empty crop.
    Transform,
    /// Crop or encode of the photo failed.
    Encoding,
    /// Network or remote error while submitting.
    Submission,
    /// Pipeline was misconfigured.
    Configuration,
    /// The attempt was dropped before it finished.
    Cancelled,
}

impl CaptureErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureErrorKind::Acquisition => "acquisition",
            CaptureErrorKind::Transform => "transform",
            CaptureErrorKind::Encoding => "encoding",
            CaptureErrorKind::Submission => "submission",
            CaptureErrorKind::Configuration => "configuration",
            CaptureErrorKind::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Photo acquisition failed: {0}")]
    Acquisition(#[from] CameraError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Submission failed: {0}")]
    Submission(#[from] SinkError),

    #[error("Step '{step}' timed out after {elapsed_ms} ms")]
    Timeout {
        step: &'static str,
        kind: CaptureErrorKind,
        elapsed_ms: u64,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capture cancelled while {phase}")]
    Cancelled { phase: CapturePhase },
}

impl CaptureError {
    pub fn acquisition(msg: impl Into<String>) -> Self {
        Self::Acquisition(CameraError::Unavailable(msg.into()))
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Which part of the pipeline failed.
    pub fn kind(&self) -> CaptureErrorKind {
        match self {
            CaptureError::Acquisition(_) => CaptureErrorKind::Acquisition,
            CaptureError::Media(e) => match e.stage() {
                MediaStage::Transform => CaptureErrorKind::Transform,
                MediaStage::Encoding => CaptureErrorKind::Encoding,
            },
            CaptureError::Submission(_) => CaptureErrorKind::Submission,
            CaptureError::Timeout { kind, .. } => *kind,
            CaptureError::Config(_) => CaptureErrorKind::Configuration,
            CaptureError::Cancelled { .. } => CaptureErrorKind::Cancelled,
        }
    }
}
