//! Coordinate Mapping from Detector Frame to Preview
//!
//! Face bounds come out of the detector in the sensor frame's native pixel
//! space. The preview is drawn in display orientation, so converting a face
//! onto the preview is an affine map:
//!
//! - **Axis swap**: on a portrait device the sensor is rotated 90° relative
//!   to the display, so preview width scales against frame *height* and
//!   preview height against frame *width*.
//! - **Mirroring**: with the front camera the preview is flipped
//!   horizontally, so `x` is reflected about the preview's vertical axis.
//!
//! Mirroring happens here and only here. Mapping preview bounds into photo
//! space (see [`crate::crop_planner`]) never flips again.
//!
//! # Usage
//! ```rust
//! use facecap_media::mapping::{FrameOrientation, PreviewMapping};
//! use facecap_models::{FrameDimensions, FrameRect, PreviewDimensions};
//!
//! let frame = FrameDimensions::new(480.0, 640.0).unwrap();
//! let preview = PreviewDimensions::new(393.0, 873.0).unwrap();
//! let mapping = PreviewMapping::new(frame, preview, FrameOrientation::Rotated, true);
//!
//! let face = mapping.map_rect(&FrameRect::new(100.0, 50.0, 80.0, 100.0));
//! assert!((face.x - 282.47).abs() < 0.01);
//! ```

use facecap_models::{FrameDimensions, FrameRect, PreviewDimensions, PreviewRect};
use serde::{Deserialize, Serialize};

/// Orientation of the sensor frame relative to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameOrientation {
    /// Sensor axes are rotated 90° from the display (portrait phone).
    #[default]
    Rotated,
    /// Sensor axes match the display axes.
    Aligned,
}

/// Frame → preview mapping for one (frame, preview) size pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewMapping {
    /// Detector frame size
    pub frame: FrameDimensions,
    /// Rendered preview size
    pub preview: PreviewDimensions,
    /// Sensor orientation
    pub orientation: FrameOrientation,
    /// Front-facing camera: reflect x across the preview
    pub mirrored: bool,
    /// Preview units per frame unit along the preview x axis
    pub scale_x: f64,
    /// Preview units per frame unit along the preview y axis
    pub scale_y: f64,
}

impl PreviewMapping {
    /// Compute the mapping for the given sizes.
    pub fn new(
        frame: FrameDimensions,
        preview: PreviewDimensions,
        orientation: FrameOrientation,
        mirrored: bool,
    ) -> Self {
        let (scale_x, scale_y) = match orientation {
            // Axes swapped: preview x runs along the frame's height
            FrameOrientation::Rotated => (
                preview.width / frame.height,
                preview.height / frame.width,
            ),
            FrameOrientation::Aligned => (
                preview.width / frame.width,
                preview.height / frame.height,
            ),
        };

        Self {
            frame,
            preview,
            orientation,
            mirrored,
            scale_x,
            scale_y,
        }
    }

    /// Map face bounds from frame space to preview space.
    ///
    /// The result is not clamped; faces partially off-frame map to bounds
    /// partially off-preview.
    pub fn map_rect(&self, bounds: &FrameRect) -> PreviewRect {
        let scaled_x = bounds.x * self.scale_x;
        let scaled_y = bounds.y * self.scale_y;
        let scaled_width = bounds.width * self.scale_x;
        let scaled_height = bounds.height * self.scale_y;

        let x = if self.mirrored {
            self.preview.width - scaled_x - scaled_width
        } else {
            scaled_x
        };

        PreviewRect::new(x, scaled_y, scaled_width, scaled_height)
    }
}
