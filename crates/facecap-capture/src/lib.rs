//! Face capture pipeline.
//!
//! This crate wires the media and sink crates into a capture flow:
//! - [`FrameAnalyzer`] picks the primary face per frame and gates capture
//! - [`CapturePipeline`] runs one throttled, single-flight attempt at a time
//! - [`CaptureSession`] holds the state both of them share
//!
//! Camera, image engine, sink and observer are traits so that platform
//! implementations and test fakes plug in the same way.

pub mod analyzer;
pub mod camera;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod session;

pub use analyzer::{select_primary_face, FrameAnalyzer, FrameDecision};
pub use camera::{Camera, PhotoOptions, StillImageCamera};
pub use config::CaptureConfig;
pub use error::{CameraError, CaptureError, CaptureErrorKind, CaptureResult};
pub use logging::CaptureLogger;
pub use pipeline::{
    CaptureObserver, CaptureOutcome, CapturePipeline, CapturePipelineBuilder, CaptureRequest,
    LoggingObserver, NoopObserver,
};
pub use session::{CaptureSession, CaptureState, SkipReason};
