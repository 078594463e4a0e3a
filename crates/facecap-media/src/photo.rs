//! Transient photo handles.
//!
//! The camera hands back either a bare filesystem path or a `file://` URI
//! for every still it takes. The file is owned by exactly one capture attempt
//! and is removed when that attempt ends.

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::MediaResult;

const FILE_SCHEME: &str = "file://";

/// Handle to a full-resolution photo on local storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoHandle {
    path: PathBuf,
}

impl PhotoHandle {
    /// Wrap a filesystem path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Accept either a `file://` URI or a plain path.
    pub fn from_uri(uri: &str) -> Self {
        let path = uri.strip_prefix(FILE_SCHEME).unwrap_or(uri);
        Self::new(path)
    }

    /// Filesystem path of the photo.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The photo as a `file://` URI.
    pub fn uri(&self) -> String {
        format!("{}{}", FILE_SCHEME, self.path.display())
    }
}

impl fmt::Display for PhotoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Delete a transient photo.
pub async fn remove_photo(photo: &PhotoHandle) -> MediaResult<()> {
    fs::remove_file(photo.path()).await?;
    tracing::debug!("Temporary photo deleted: {}", photo);
    Ok(())
}
