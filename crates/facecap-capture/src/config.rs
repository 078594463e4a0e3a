//! Capture pipeline configuration.

use std::time::Duration;

use facecap_media::{CropPadding, FrameOrientation, DEFAULT_JPEG_QUALITY};

use crate::error::{CaptureError, CaptureResult};

/// Capture pipeline configuration.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Minimum quiet interval between two accepted attempts
    pub throttle: Duration,
    /// Face-relative crop padding
    pub padding: CropPadding,
    /// JPEG quality for cropped faces, in (0.0, 1.0]
    pub jpeg_quality: f32,
    /// Per-step timeout. `None` lets a stalled step block the pipeline.
    pub step_timeout: Option<Duration>,
    /// Front-facing camera (preview is mirrored)
    pub mirrored: bool,
    /// Sensor orientation relative to the display
    pub orientation: FrameOrientation,
    /// Fire the flash when taking the photo
    pub flash: bool,
    /// Play the shutter sound when taking the photo
    pub shutter_sound: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            throttle: Duration::from_millis(2000),
            padding: CropPadding::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            step_timeout: None,
            mirrored: false,
            orientation: FrameOrientation::Rotated,
            flash: false,
            shutter_sound: false,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

impl CaptureConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            throttle: env_parse("CAPTURE_THROTTLE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.throttle),
            padding: CropPadding {
                top: env_parse("CAPTURE_TOP_PAD_RATIO").unwrap_or(defaults.padding.top),
                bottom: env_parse("CAPTURE_BOTTOM_PAD_RATIO").unwrap_or(defaults.padding.bottom),
                side: env_parse("CAPTURE_SIDE_PAD_RATIO").unwrap_or(defaults.padding.side),
            },
            jpeg_quality: env_parse("CAPTURE_JPEG_QUALITY").unwrap_or(defaults.jpeg_quality),
            step_timeout: env_parse("CAPTURE_STEP_TIMEOUT_MS").map(Duration::from_millis),
            mirrored: env_flag("CAPTURE_MIRRORED").unwrap_or(defaults.mirrored),
            orientation: match std::env::var("CAPTURE_ORIENTATION").ok().as_deref() {
                Some("aligned") => FrameOrientation::Aligned,
                _ => defaults.orientation,
            },
            flash: env_flag("CAPTURE_FLASH").unwrap_or(defaults.flash),
            shutter_sound: env_flag("CAPTURE_SHUTTER_SOUND").unwrap_or(defaults.shutter_sound),
        }
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> CaptureResult<()> {
        if !self.padding.is_valid() {
            return Err(CaptureError::config(format!(
                "padding ratios must be finite and non-negative: {:?}",
                self.padding
            )));
        }
        if !(self.jpeg_quality > 0.0 && self.jpeg_quality <= 1.0) {
            return Err(CaptureError::config(format!(
                "jpeg quality must be in (0.0, 1.0], got {}",
                self.jpeg_quality
            )));
        }
        if self.step_timeout == Some(Duration::ZERO) {
            return Err(CaptureError::config("step timeout must be non-zero"));
        }
        Ok(())
    }

    /// Builder-style throttle override.
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Builder-style mirroring override.
    pub fn with_mirrored(mut self, mirrored: bool) -> Self {
        self.mirrored = mirrored;
        self
    }

    /// Builder-style step timeout override.
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CaptureConfig::default();
        assert_eq!(config.throttle, Duration::from_millis(2000));
        assert_eq!(config.jpeg_quality, 0.9);
        assert!(config.step_timeout.is_none());
        assert!(!config.flash);
        assert!(!config.shutter_sound);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = CaptureConfig::default();
        config.jpeg_quality = 0.0;
        assert!(config.validate().is_err());

        let mut config = CaptureConfig::default();
        config.padding.side = -0.2;
        assert!(config.validate().is_err());

        let config = CaptureConfig::default().with_step_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
