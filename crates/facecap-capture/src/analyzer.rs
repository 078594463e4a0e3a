//! Per-frame face selection and capture gating.
//!
//! Runs on the frame producer's path, so nothing here awaits the pipeline.
//! An eligible frame hands the mapped bounds to [`CapturePipeline::trigger`]
//! and returns immediately.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use facecap_media::PreviewMapping;
use facecap_models::{FrameDimensions, FrameRect, PreviewDimensions};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::pipeline::{CaptureOutcome, CapturePipeline, CaptureRequest};
use crate::session::SkipReason;

/// Pick the face with the largest bounding-box area.
///
/// Ties go to the first face in detector order.
pub fn select_primary_face(faces: &[FrameRect]) -> Option<&FrameRect> {
    faces.iter().fold(None, |best: Option<&FrameRect>, face| match best {
        Some(current) if current.area() >= face.area() => Some(current),
        _ => Some(face),
    })
}

/// What the analyzer did with one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameDecision {
    /// No face in the frame.
    NoFace,
    /// An attempt is already in flight.
    Busy,
    /// The session already produced its capture.
    AlreadyCaptured,
    /// Preview size not observed yet.
    AwaitingLayout,
    /// Frame size unknown for this frame.
    AwaitingFrame,
    /// An attempt was started.
    Triggered,
    /// The pipeline's own guard turned the attempt down.
    Rejected(SkipReason),
}

/// Frame analysis loop state for one screen activation.
#[derive(Debug)]
pub struct FrameAnalyzer {
    pipeline: CapturePipeline,
    preview: OnceLock<PreviewDimensions>,
    last_face_count: AtomicUsize,
    in_flight: Mutex<Option<JoinHandle<CaptureOutcome>>>,
}

impl FrameAnalyzer {
    pub fn new(pipeline: CapturePipeline) -> Self {
        Self {
            pipeline,
            preview: OnceLock::new(),
            last_face_count: AtomicUsize::new(0),
            in_flight: Mutex::new(None),
        }
    }

    /// Record the preview size once layout has completed.
    ///
    /// Only the first observation is kept. Returns `false` if a size was
    /// already recorded.
    pub fn on_preview_layout(&self, preview: PreviewDimensions) -> bool {
        let accepted = self.preview.set(preview).is_ok();
        if accepted {
            debug!("Preview layout observed: {}", preview);
        }
        accepted
    }

    pub fn preview(&self) -> Option<PreviewDimensions> {
        self.preview.get().copied()
    }

    /// Number of faces in the most recent frame.
    pub fn last_face_count(&self) -> usize {
        self.last_face_count.load(Ordering::Relaxed)
    }

    pub fn pipeline(&self) -> &CapturePipeline {
        &self.pipeline
    }

    /// Handle one detector result.
    pub fn on_frame(&self, faces: &[FrameRect], frame: Option<FrameDimensions>) -> FrameDecision {
        self.last_face_count.store(faces.len(), Ordering::Relaxed);

        let Some(face) = select_primary_face(faces) else {
            return FrameDecision::NoFace;
        };

        let session = self.pipeline.session().snapshot();
        if session.is_capturing {
            return FrameDecision::Busy;
        }
        if session.completed {
            return FrameDecision::AlreadyCaptured;
        }
        let Some(preview) = self.preview() else {
            return FrameDecision::AwaitingLayout;
        };
        let Some(frame) = frame else {
            return FrameDecision::AwaitingFrame;
        };

        let config = self.pipeline.config();
        let mapping = PreviewMapping::new(frame, preview, config.orientation, config.mirrored);
        let bounds = mapping.map_rect(face);
        debug!("Face {} mapped to {}", face, bounds);

        match self.pipeline.trigger(CaptureRequest::face(bounds, preview)) {
            Ok(handle) => {
                // A previous handle can only belong to a finished attempt
                *self.lock_in_flight() = Some(handle);
                FrameDecision::Triggered
            }
            Err(reason) => FrameDecision::Rejected(reason),
        }
    }

    /// Wait for the most recently triggered attempt, if any.
    pub async fn settle(&self) -> Option<CaptureOutcome> {
        let handle = self.lock_in_flight().take()?;
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!("Capture task did not complete: {}", e);
                None
            }
        }
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<CaptureOutcome>>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }
}
