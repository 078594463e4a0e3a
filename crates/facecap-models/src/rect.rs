//! Rectangles and dimensions tagged with the coordinate space they live in.
//!
//! Three spaces take part in a capture:
//! - **Frame space**: the detector's native sensor frame
//! - **Preview space**: the on-screen rendered preview
//! - **Photo space**: pixels of the full-resolution still
//!
//! A value never changes space implicitly. Conversions live in
//! `facecap_media::mapping` (frame to preview) and `facecap_media::crop_planner`
//! (preview to photo) and produce a value of the target space.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker trait for coordinate spaces.
pub trait CoordinateSpace: Copy + Default + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Short name used in logs and error messages.
    const NAME: &'static str;
}

/// Detector frame space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSpace;

/// Rendered preview space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewSpace;

/// Full-resolution photo pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhotoSpace;

impl CoordinateSpace for FrameSpace {
    const NAME: &'static str = "frame";
}

impl CoordinateSpace for PreviewSpace {
    const NAME: &'static str = "preview";
}

impl CoordinateSpace for PhotoSpace {
    const NAME: &'static str = "photo";
}

/// Errors raised when constructing dimensions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DimensionsError {
    #[error("{space} dimensions must be positive and finite, got {width}x{height}")]
    NotPositive {
        space: &'static str,
        width: f64,
        height: f64,
    },
}

/// Axis-aligned rectangle in space `S`.
///
/// Width and height are expected to be non-negative. The origin may fall
/// outside the enclosing space before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Rect<S> {
    /// Left edge x-coordinate
    pub x: f64,
    /// Top edge y-coordinate
    pub y: f64,
    /// Rectangle width
    pub width: f64,
    /// Rectangle height
    pub height: f64,
    #[serde(skip)]
    space: PhantomData<S>,
}

/// Face bounds as reported by the detector.
pub type FrameRect = Rect<FrameSpace>;
/// Face bounds mapped onto the preview.
pub type PreviewRect = Rect<PreviewSpace>;
/// Face bounds mapped onto the captured photo.
pub type PhotoRect = Rect<PhotoSpace>;

impl<S: CoordinateSpace> Rect<S> {
    /// Create a new rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            space: PhantomData,
        }
    }

    /// Right edge x-coordinate.
    #[inline]
    pub fn x2(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate.
    #[inline]
    pub fn y2(&self) -> f64 {
        self.y + self.height
    }

    /// Rectangle area.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// All components are finite and the extent is non-negative.
    pub fn is_well_formed(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// Uniformly scale about the space origin.
    pub fn scaled(&self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k, self.width * k, self.height * k)
    }
}

impl<S: CoordinateSpace> fmt::Display for Rect<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[x={:.2}, y={:.2}, w={:.2}, h={:.2}]",
            S::NAME,
            self.x,
            self.y,
            self.width,
            self.height
        )
    }
}

/// Width/height pair in space `S`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Dimensions<S> {
    pub width: f64,
    pub height: f64,
    #[serde(skip)]
    space: PhantomData<S>,
}

/// Native detector frame size. Axes may be rotated relative to the display.
pub type FrameDimensions = Dimensions<FrameSpace>;
/// Realized on-screen preview size, observed once from layout.
pub type PreviewDimensions = Dimensions<PreviewSpace>;
/// Pixel size of the captured still, read from the photo itself.
pub type PhotoDimensions = Dimensions<PhotoSpace>;

impl<S: CoordinateSpace> Dimensions<S> {
    /// Create dimensions, rejecting zero, negative and non-finite sizes.
    pub fn new(width: f64, height: f64) -> Result<Self, DimensionsError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(DimensionsError::NotPositive {
                space: S::NAME,
                width,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            space: PhantomData,
        })
    }

    /// Create dimensions from integer pixel counts.
    pub fn from_pixels(width: u32, height: u32) -> Result<Self, DimensionsError> {
        Self::new(width as f64, height as f64)
    }

    /// Both sides are positive and finite.
    ///
    /// Always true for values built through [`Dimensions::new`]; deserialized
    /// values are not checked on the way in.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl<S: CoordinateSpace> fmt::Display for Dimensions<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}x{}]", S::NAME, self.width, self.height)
    }
}

/// Integer crop rectangle in photo pixel space.
///
/// The only rectangle ever handed to the crop engine. Produced by the crop
/// planner, which guarantees `origin_x + width <= photo width` and
/// `origin_y + height <= photo height` with non-zero extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRect {
    pub origin_x: u32,
    pub origin_y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Create a new crop rectangle.
    pub fn new(origin_x: u32, origin_y: u32, width: u32, height: u32) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
        }
    }

    /// Whether the rectangle lies inside a `photo_width` x `photo_height` image.
    pub fn fits_within(&self, photo_width: u32, photo_height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.origin_x as u64 + self.width as u64 <= photo_width as u64
            && self.origin_y as u64 + self.height as u64 <= photo_height as u64
    }

    /// Pixel area.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "crop[x={}, y={}, w={}, h={}]",
            self.origin_x, self.origin_y, self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_area_and_edges() {
        let r = FrameRect::new(100.0, 50.0, 80.0, 100.0);
        assert_eq!(r.area(), 8000.0);
        assert_eq!(r.x2(), 180.0);
        assert_eq!(r.y2(), 150.0);
    }

    #[test]
    fn test_rect_well_formed() {
        assert!(PreviewRect::new(-10.0, 5.0, 20.0, 20.0).is_well_formed());
        assert!(!PreviewRect::new(0.0, 0.0, -1.0, 20.0).is_well_formed());
        assert!(!PreviewRect::new(f64::NAN, 0.0, 1.0, 1.0).is_well_formed());
    }

    #[test]
    fn test_rect_display_names_space() {
        let r = PhotoRect::new(1.0, 2.0, 3.0, 4.0);
        assert!(r.to_string().starts_with("photo["));
    }

    #[test]
    fn test_dimensions_reject_zero() {
        assert!(FrameDimensions::new(0.0, 640.0).is_err());
        assert!(PreviewDimensions::new(393.0, f64::INFINITY).is_err());
        assert!(PhotoDimensions::from_pixels(3000, 4000).is_ok());
    }

    #[test]
    fn test_rect_serializes_without_space_tag() {
        let r = FrameRect::new(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_value(r).unwrap();
        assert_eq!(json, serde_json::json!({"x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0}));

        let back: FrameRect = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_crop_rect_camel_case() {
        let json = serde_json::to_string(&CropRect::new(1, 2, 3, 4)).unwrap();
        assert!(json.contains("\"originX\":1"));
        assert!(json.contains("\"originY\":2"));
    }

    #[test]
    fn test_crop_rect_fits_within() {
        assert!(CropRect::new(0, 0, 3000, 4000).fits_within(3000, 4000));
        assert!(!CropRect::new(1, 0, 3000, 4000).fits_within(3000, 4000));
        assert!(!CropRect::new(0, 0, 0, 10).fits_within(3000, 4000));
    }
}
