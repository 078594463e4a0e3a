//! Camera collaborator.
//!
//! The pipeline only needs three things from a camera: whether a session is
//! active, a way to take a full-resolution still, and a way to throw that
//! still away again.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use facecap_media::{remove_photo, MediaResult, PhotoHandle};
use tracing::debug;
use uuid::Uuid;

use crate::error::CameraError;

/// Flags passed to the camera for a still capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhotoOptions {
    pub flash: bool,
    pub shutter_sound: bool,
}

/// Source of full-resolution photos.
#[async_trait]
pub trait Camera: Send + Sync {
    /// An active camera session exists.
    fn is_ready(&self) -> bool;

    /// Take a full-resolution still and return a handle to its temporary file.
    async fn take_photo(&self, options: PhotoOptions) -> Result<PhotoHandle, CameraError>;

    /// Delete a still returned by [`Camera::take_photo`].
    async fn discard_photo(&self, photo: &PhotoHandle) -> MediaResult<()> {
        remove_photo(photo).await
    }
}

/// Camera that "captures" by copying a still image into a work directory.
///
/// Used by the replay binary and in tests in place of a device camera.
#[derive(Debug)]
pub struct StillImageCamera {
    source: PathBuf,
    work_dir: PathBuf,
    active: AtomicBool,
}

impl StillImageCamera {
    /// Create a camera serving copies of `source` into `work_dir`.
    pub fn new(source: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            work_dir: work_dir.into(),
            active: AtomicBool::new(true),
        }
    }

    /// Still image every capture is copied from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Start or stop the camera session.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }
}

#[async_trait]
impl Camera for StillImageCamera {
    fn is_ready(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn take_photo(&self, options: PhotoOptions) -> Result<PhotoHandle, CameraError> {
        if !self.is_ready() {
            return Err(CameraError::Unavailable("camera session is inactive".to_string()));
        }
        if !self.source.exists() {
            return Err(CameraError::Unavailable(format!(
                "still image not found: {}",
                self.source.display()
            )));
        }

        tokio::fs::create_dir_all(&self.work_dir).await?;
        let target = self.work_dir.join(format!("photo-{}.jpg", Uuid::new_v4()));
        tokio::fs::copy(&self.source, &target).await?;

        debug!(
            flash = options.flash,
            shutter_sound = options.shutter_sound,
            "Still copied to {}",
            target.display()
        );
        Ok(PhotoHandle::new(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_still_camera_copies_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("still.jpg");
        std::fs::write(&source, b"not really a jpeg").unwrap();

        let camera = StillImageCamera::new(&source, dir.path().join("work"));
        let photo = camera.take_photo(PhotoOptions::default()).await.unwrap();

        assert_ne!(photo.path(), source.as_path());
        assert_eq!(std::fs::read(photo.path()).unwrap(), b"not really a jpeg");

        camera.discard_photo(&photo).await.unwrap();
        assert!(!photo.path().exists());
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_inactive_camera_refuses() {
        let dir = TempDir::new().unwrap();
        let camera = StillImageCamera::new(dir.path().join("still.jpg"), dir.path());
        camera.set_active(false);

        assert!(!camera.is_ready());
        let err = camera.take_photo(PhotoOptions::default()).await.unwrap_err();
        assert!(matches!(err, CameraError::Unavailable(_)));
    }
}
