//! Crop/encode engine.
//!
//! Reads the captured photo, crops it to a [`CropRect`], re-encodes the
//! region as JPEG and returns it base64-encoded. Decoding and encoding run on
//! the blocking pool so the capture task never stalls the runtime.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use facecap_models::{CropRect, PhotoDimensions};
use image::codecs::jpeg::JpegEncoder;
use image::GenericImageView;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Default JPEG quality for cropped faces.
pub const DEFAULT_JPEG_QUALITY: f32 = 0.9;

/// Image operations the capture pipeline depends on.
#[async_trait]
pub trait ImageEngine: Send + Sync {
    /// Pixel size of the image at `path`, read from the file itself.
    async fn dimensions(&self, path: &Path) -> MediaResult<PhotoDimensions>;

    /// Crop the image at `path` and return the encoded region as base64.
    async fn crop_to_base64(&self, path: &Path, rect: CropRect) -> MediaResult<String>;

    /// Return the file at `path` as base64 without re-encoding.
    async fn encode_full(&self, path: &Path) -> MediaResult<String>;
}

/// JPEG engine backed by the `image` crate.
#[derive(Debug, Clone, Copy)]
pub struct JpegEngine {
    quality: f32,
}

impl Default for JpegEngine {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl JpegEngine {
    /// Create an engine with the given quality in `(0.0, 1.0]`.
    pub fn new(quality: f32) -> MediaResult<Self> {
        if !(quality > 0.0 && quality <= 1.0) {
            return Err(MediaError::InvalidQuality(quality));
        }
        Ok(Self { quality })
    }

    /// Configured quality.
    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Quality on the encoder's 1..=100 scale.
    fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    fn crop_blocking(path: &Path, rect: CropRect, quality: u8) -> MediaResult<String> {
        let img = image::open(path).map_err(|e| MediaError::decode(e.to_string()))?;
        let (width, height) = img.dimensions();

        if !rect.fits_within(width, height) {
            return Err(MediaError::CropOutOfBounds {
                rect: rect.to_string(),
                photo_width: width,
                photo_height: height,
            });
        }

        let region = img
            .crop_imm(rect.origin_x, rect.origin_y, rect.width, rect.height)
            .to_rgb8();

        let mut buf = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut buf, quality)
            .encode_image(&region)
            .map_err(|e| MediaError::encode(e.to_string()))?;

        Ok(STANDARD.encode(buf.into_inner()))
    }
}

#[async_trait]
impl ImageEngine for JpegEngine {
    async fn dimensions(&self, path: &Path) -> MediaResult<PhotoDimensions> {
        let owned: PathBuf = path.to_path_buf();
        let (width, height) = tokio::task::spawn_blocking(move || image::image_dimensions(&owned))
            .await
            .map_err(|e| MediaError::internal(e.to_string()))?
            .map_err(|e| MediaError::SizeReadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(PhotoDimensions::from_pixels(width, height)?)
    }

    async fn crop_to_base64(&self, path: &Path, rect: CropRect) -> MediaResult<String> {
        let owned = path.to_path_buf();
        let quality = self.jpeg_quality();

        let encoded = tokio::task::spawn_blocking(move || Self::crop_blocking(&owned, rect, quality))
            .await
            .map_err(|e| MediaError::internal(e.to_string()))??;

        debug!(
            rect = %rect,
            quality,
            chars = encoded.len(),
            "Cropped and encoded face region"
        );
        Ok(encoded)
    }

    async fn encode_full(&self, path: &Path) -> MediaResult<String> {
        let bytes = tokio::fs::read(path).await?;
        Ok(STANDARD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    fn write_test_jpeg(dir: &TempDir, width: u32, height: u32) -> PathBuf {
        let path = dir.path().join("photo.jpg");
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128u8])
        });
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_quality_validation() {
        assert!(JpegEngine::new(0.9).is_ok());
        assert!(JpegEngine::new(1.0).is_ok());
        assert!(matches!(JpegEngine::new(0.0), Err(MediaError::InvalidQuality(_))));
        assert!(JpegEngine::new(1.5).is_err());
        assert!(JpegEngine::new(f32::NAN).is_err());
    }

    #[test]
    fn test_quality_scale() {
        assert_eq!(JpegEngine::default().jpeg_quality(), 90);
        assert_eq!(JpegEngine::new(0.001).unwrap().jpeg_quality(), 1);
    }

    #[tokio::test]
    async fn test_dimensions_read_from_file() {
        let dir = TempDir::new().unwrap();
        let path = write_test_jpeg(&dir, 120, 160);

        let dims = JpegEngine::default().dimensions(&path).await.unwrap();
        assert_eq!(dims.width, 120.0);
        assert_eq!(dims.height, 160.0);
    }

    #[tokio::test]
    async fn test_dimensions_of_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = JpegEngine::default()
            .dimensions(&dir.path().join("missing.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::SizeReadFailed { .. }));
    }

    #[tokio::test]
    async fn test_crop_produces_jpeg_of_requested_size() {
        let dir = TempDir::new().unwrap();
        let path = write_test_jpeg(&dir, 120, 160);

        let encoded = JpegEngine::default()
            .crop_to_base64(&path, CropRect::new(10, 20, 50, 70))
            .await
            .unwrap();

        let bytes = STANDARD.decode(encoded).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (50, 70));
    }

    #[tokio::test]
    async fn test_crop_outside_photo_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_test_jpeg(&dir, 120, 160);

        let err = JpegEngine::default()
            .crop_to_base64(&path, CropRect::new(100, 0, 50, 50))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::CropOutOfBounds { .. }));
    }

    #[tokio::test]
    async fn test_encode_full_is_raw_file_bytes() {
        let dir = TempDir::new().unwrap();
        let path = write_test_jpeg(&dir, 32, 32);

        let encoded = JpegEngine::default().encode_full(&path).await.unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap(), std::fs::read(&path).unwrap());
    }
}
