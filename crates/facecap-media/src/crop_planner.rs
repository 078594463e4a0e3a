//! Crop rectangle computation in photo pixel space.
//!
//! Converts preview-space face bounds into the captured photo's pixel space,
//! pads the face (more room above and below than at the sides, scaled by the
//! face size), and clamps the result so the crop engine never receives a
//! rectangle that reaches outside the photo.

use facecap_models::{CropRect, PhotoDimensions, PhotoRect, PreviewDimensions, PreviewRect};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Face-relative padding ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropPadding {
    /// Added above the face, as a fraction of face height (default: 0.30)
    pub top: f64,
    /// Added below the face, as a fraction of face height (default: 0.30)
    pub bottom: f64,
    /// Added to each side, as a fraction of face width (default: 0.20)
    pub side: f64,
}

impl Default for CropPadding {
    fn default() -> Self {
        Self {
            top: 0.30,
            bottom: 0.30,
            side: 0.20,
        }
    }
}

impl CropPadding {
    /// Padding ratios that leave the face box unchanged.
    pub fn none() -> Self {
        Self {
            top: 0.0,
            bottom: 0.0,
            side: 0.0,
        }
    }

    /// All ratios are finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.top, self.bottom, self.side]
            .iter()
            .all(|r| r.is_finite() && *r >= 0.0)
    }
}

/// Crop planner for computing photo-space crop rectangles.
#[derive(Debug, Clone, Copy, Default)]
pub struct CropPlanner {
    padding: CropPadding,
}

impl CropPlanner {
    /// Create a new crop planner.
    pub fn new(padding: CropPadding) -> Self {
        Self { padding }
    }

    /// Padding ratios in use.
    pub fn padding(&self) -> CropPadding {
        self.padding
    }

    /// Scale preview-space bounds into photo pixel space.
    ///
    /// Pure scaling. Any mirroring was already applied when the bounds were
    /// mapped onto the preview.
    pub fn to_photo_space(
        bounds: &PreviewRect,
        preview: &PreviewDimensions,
        photo: &PhotoDimensions,
    ) -> PhotoRect {
        let scale_x = photo.width / preview.width;
        let scale_y = photo.height / preview.height;

        PhotoRect::new(
            bounds.x * scale_x,
            bounds.y * scale_y,
            bounds.width * scale_x,
            bounds.height * scale_y,
        )
    }

    /// Compute the padded, clamped crop rectangle for a face.
    ///
    /// `photo` must be the size read from the captured photo itself. If the
    /// clamped face is empty the face lies entirely outside the photo and an
    /// error is returned.
    ///
    /// The unpadded fallback is only reachable with negative padding, i.e.
    /// when a planner is built without [`CropPadding::is_valid`] being
    /// checked. Non-negative padding always contains the face, so an empty
    /// padded crop means an empty face crop too.
    ///
    /// # Arguments
    /// * `bounds` - Face bounds in preview space
    /// * `preview` - Preview size the bounds were measured against
    /// * `photo` - Pixel size of the captured photo
    pub fn plan(
        &self,
        bounds: &PreviewRect,
        preview: &PreviewDimensions,
        photo: &PhotoDimensions,
    ) -> MediaResult<CropRect> {
        if !bounds.is_well_formed() {
            return Err(MediaError::invalid_bounds(bounds.to_string()));
        }
        if !preview.is_valid() || !photo.is_valid() {
            return Err(MediaError::invalid_bounds(format!(
                "cannot map {} from {} to {}",
                bounds, preview, photo
            )));
        }

        let face = Self::to_photo_space(bounds, preview, photo);
        let photo_width = photo.width.floor() as u32;
        let photo_height = photo.height.floor() as u32;

        let top_pad = face.height * self.padding.top;
        let bottom_pad = face.height * self.padding.bottom;
        let side_pad = face.width * self.padding.side;

        let padded = PhotoRect::new(
            face.x - side_pad,
            face.y - top_pad,
            face.width + 2.0 * side_pad,
            face.height + top_pad + bottom_pad,
        );

        if let Some(rect) = clamp_to_photo(&padded, photo_width, photo_height) {
            return Ok(rect);
        }

        debug!(
            face = %face,
            "Padded crop collapsed after clamping, falling back to unpadded face"
        );

        clamp_to_photo(&face, photo_width, photo_height).ok_or(MediaError::EmptyCrop {
            photo_width,
            photo_height,
        })
    }
}

/// Clamp a photo-space rectangle to `[0, width] x [0, height]` and round it.
///
/// The origin is pushed inside the photo without shrinking the box, then the
/// far edges are cut at the photo border. Rounding happens last and is
/// followed by a final integer clamp so the rounded rectangle still fits.
/// Returns `None` when nothing of positive size remains.
fn clamp_to_photo(rect: &PhotoRect, photo_width: u32, photo_height: u32) -> Option<CropRect> {
    let max_x = photo_width as f64;
    let max_y = photo_height as f64;

    let origin_x = rect.x.max(0.0);
    let origin_y = rect.y.max(0.0);

    let mut width = rect.width;
    let mut height = rect.height;
    if origin_x + width > max_x {
        width = max_x - origin_x;
    }
    if origin_y + height > max_y {
        height = max_y - origin_y;
    }

    if !(width > 0.0 && height > 0.0) {
        return None;
    }

    let x = (origin_x.round() as i64).min(photo_width as i64);
    let y = (origin_y.round() as i64).min(photo_height as i64);
    let w = (width.round() as i64).min(photo_width as i64 - x);
    let h = (height.round() as i64).min(photo_height as i64 - y);

    if w <= 0 || h <= 0 {
        return None;
    }

    Some(CropRect::new(x as u32, y as u32, w as u32, h as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview() -> PreviewDimensions {
        PreviewDimensions::new(393.0, 873.0).unwrap()
    }

    fn photo() -> PhotoDimensions {
        PhotoDimensions::from_pixels(3000, 4000).unwrap()
    }

    #[test]
    fn test_default_padding_ratios() {
        let padding = CropPadding::default();
        assert_eq!(padding.top, 0.30);
        assert_eq!(padding.bottom, 0.30);
        assert_eq!(padding.side, 0.20);
        assert!(padding.is_valid());
        assert!(!CropPadding { top: -0.1, ..padding }.is_valid());
    }

    #[test]
    fn test_scenario_front_camera_face() {
        let planner = CropPlanner::default();
        let bounds = PreviewRect::new(282.47, 90.94, 49.12, 181.88);

        let face = CropPlanner::to_photo_space(&bounds, &preview(), &photo());
        let crop = planner.plan(&bounds, &preview(), &photo()).unwrap();

        assert!(crop.fits_within(3000, 4000), "{crop}");
        assert!(crop.width as f64 > face.width);
        assert!(crop.height as f64 > face.height);

        // x = 282.47 * 3000/393, side pad 20% of the scaled width
        assert_eq!(crop.origin_x, 2081);
        assert_eq!(crop.origin_y, 167);
        assert_eq!(crop.width, 525);
        assert_eq!(crop.height, 1333);
    }

    #[test]
    fn test_left_edge_clamps_to_zero() {
        let planner = CropPlanner::default();
        let bounds = PreviewRect::new(0.0, 200.0, 100.0, 150.0);

        let crop = planner.plan(&bounds, &preview(), &photo()).unwrap();
        assert_eq!(crop.origin_x, 0);
        assert!(crop.fits_within(3000, 4000));
    }

    #[test]
    fn test_bounds_larger_than_preview_fill_photo() {
        let planner = CropPlanner::default();
        let bounds = PreviewRect::new(-50.0, -50.0, 600.0, 1200.0);

        let crop = planner.plan(&bounds, &preview(), &photo()).unwrap();
        assert_eq!(crop, CropRect::new(0, 0, 3000, 4000));
    }

    #[test]
    fn test_bottom_right_corner_is_cut_at_border() {
        let planner = CropPlanner::default();
        let bounds = PreviewRect::new(350.0, 800.0, 60.0, 100.0);

        let crop = planner.plan(&bounds, &preview(), &photo()).unwrap();
        assert!(crop.fits_within(3000, 4000), "{crop}");
        assert_eq!(crop.origin_x + crop.width, 3000);
        assert_eq!(crop.origin_y + crop.height, 4000);
    }

    #[test]
    fn test_rounding_never_spills_past_border() {
        // Half-pixel origin rounds up while the width rounds up as well
        let planner = CropPlanner::new(CropPadding::none());
        let preview = PreviewDimensions::new(100.0, 100.0).unwrap();
        let photo = PhotoDimensions::from_pixels(100, 100).unwrap();
        let bounds = PreviewRect::new(0.5, 0.5, 99.5, 99.5);

        let crop = planner.plan(&bounds, &preview, &photo).unwrap();
        assert!(crop.fits_within(100, 100), "{crop}");
    }

    #[test]
    fn test_unvalidated_negative_padding_falls_back_to_face() {
        let padding = CropPadding {
            top: 0.3,
            bottom: 0.3,
            side: -0.6,
        };
        assert!(!padding.is_valid());

        let bounds = PreviewRect::new(282.47, 90.94, 49.12, 181.88);
        let crop = CropPlanner::new(padding)
            .plan(&bounds, &preview(), &photo())
            .unwrap();

        assert_eq!(crop, CropRect::new(2156, 417, 375, 833));
    }

    #[test]
    fn test_face_beyond_right_edge_is_empty() {
        let planner = CropPlanner::default();
        let bounds = PreviewRect::new(500.0, 100.0, 40.0, 40.0);

        let err = planner.plan(&bounds, &preview(), &photo()).unwrap_err();
        assert!(matches!(err, MediaError::EmptyCrop { .. }));
    }

    #[test]
    fn test_malformed_bounds_rejected() {
        let planner = CropPlanner::default();
        let bounds = PreviewRect::new(10.0, 10.0, -5.0, 20.0);

        let err = planner.plan(&bounds, &preview(), &photo()).unwrap_err();
        assert!(matches!(err, MediaError::InvalidBounds(_)));

        let bounds = PreviewRect::new(f64::NAN, 10.0, 5.0, 20.0);
        assert!(planner.plan(&bounds, &preview(), &photo()).is_err());
    }

    #[test]
    fn test_crop_always_contained_over_grid() {
        let planner = CropPlanner::default();
        let sizes = [(1u32, 1u32), (7, 13), (640, 480), (3000, 4000)];
        let origins = [-500.0, -1.0, 0.0, 0.4, 150.0, 392.9, 393.0, 900.0];
        let extents = [0.0, 0.3, 10.0, 200.0, 2000.0];

        for (pw, ph) in sizes {
            let photo = PhotoDimensions::from_pixels(pw, ph).unwrap();
            for &x in &origins {
                for &y in &origins {
                    for &w in &extents {
                        for &h in &extents {
                            let bounds = PreviewRect::new(x, y, w, h);
                            match planner.plan(&bounds, &preview(), &photo) {
                                Ok(crop) => assert!(
                                    crop.fits_within(pw, ph),
                                    "{crop} outside {pw}x{ph} for {bounds}"
                                ),
                                Err(MediaError::EmptyCrop { .. }) => {}
                                Err(e) => panic!("unexpected error {e} for {bounds}"),
                            }
                        }
                    }
                }
            }
        }
    }
}
