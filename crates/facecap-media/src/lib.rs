//! Media operations for the face capture pipeline.
//!
//! This crate provides:
//! - Frame → preview coordinate mapping with rotation and mirroring
//! - Preview → photo crop planning with face-relative padding and clamping
//! - JPEG crop/encode engine producing base64 payloads
//! - Transient photo handle helpers

pub mod crop_planner;
pub mod encode;
pub mod error;
pub mod mapping;
pub mod photo;

pub use crop_planner::{CropPadding, CropPlanner};
pub use encode::{ImageEngine, JpegEngine, DEFAULT_JPEG_QUALITY};
pub use error::{MediaError, MediaResult, MediaStage};
pub use mapping::{FrameOrientation, PreviewMapping};
pub use photo::{remove_photo, PhotoHandle};
