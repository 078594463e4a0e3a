//! Shared data models for the face capture pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Rectangles and dimensions tagged with their coordinate space
//! - The integer crop rectangle handed to the crop engine
//! - Capture phases and the payload submitted to the ingestion endpoint

pub mod capture;
pub mod rect;

// Re-export common types
pub use capture::{CapturePayload, CapturePhase};
pub use rect::{
    CoordinateSpace, CropRect, Dimensions, DimensionsError, FrameDimensions, FrameRect, FrameSpace, PhotoDimensions,
    PhotoRect, PhotoSpace, PreviewDimensions, PreviewRect, PreviewSpace, Rect,
};
