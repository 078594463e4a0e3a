//! Error types for media operations.

use std::path::PathBuf;

use facecap_models::rect::DimensionsError;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Pipeline stage a media error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaStage {
    /// Coordinate mapping, crop planning, reading the photo size.
    Transform,
    /// Cropping pixels and encoding the payload.
    Encoding,
}

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Invalid face bounds: {0}")]
    InvalidBounds(String),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(#[from] DimensionsError),

    #[error("Crop region is empty for a {photo_width}x{photo_height} photo")]
    EmptyCrop { photo_width: u32, photo_height: u32 },

    #[error("Crop {rect} does not fit a {photo_width}x{photo_height} photo")]
    CropOutOfBounds {
        rect: String,
        photo_width: u32,
        photo_height: u32,
    },

    #[error("Failed to read image size of {path}: {message}")]
    SizeReadFailed { path: PathBuf, message: String },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("JPEG quality must be in (0.0, 1.0], got {0}")]
    InvalidQuality(f32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an invalid bounds error.
    pub fn invalid_bounds(message: impl Into<String>) -> Self {
        Self::InvalidBounds(message.into())
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create an encode error.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stage of the pipeline this error was raised in.
    pub fn stage(&self) -> MediaStage {
        match self {
            MediaError::InvalidBounds(_)
            | MediaError::InvalidDimensions(_)
            | MediaError::EmptyCrop { .. }
            | MediaError::CropOutOfBounds { .. }
            | MediaError::SizeReadFailed { .. } => MediaStage::Transform,
            MediaError::Decode(_)
            | MediaError::Encode(_)
            | MediaError::InvalidQuality(_)
            | MediaError::Io(_)
            | MediaError::Internal(_) => MediaStage::Encoding,
        }
    }
}
