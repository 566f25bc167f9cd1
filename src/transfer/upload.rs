//! Temporary uploaded files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use super::error::{TransferError, TransferResult};

/// An uploaded file on local disk, removed when dropped.
///
/// Removal failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
    original_name: Option<String>,
}

impl TempUpload {
    /// Take ownership of an existing file.
    pub fn new(path: impl Into<PathBuf>, original_name: Option<String>) -> Self {
        Self {
            path: path.into(),
            original_name,
        }
    }

    /// Write `bytes` to a fresh, randomly named file in `dir`.
    pub async fn persist(
        dir: &Path,
        original_name: Option<String>,
        bytes: &[u8],
    ) -> TransferResult<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| TransferError::io(format!("failed to create {}", dir.display()), e))?;

        let path = dir.join(format!("upload_{}", Uuid::new_v4().simple()));
        let upload = Self::new(path, original_name);
        tokio::fs::write(&upload.path, bytes)
            .await
            .map_err(|e| TransferError::io("failed to store upload", e))?;

        debug!(path = %upload.path.display(), bytes = bytes.len(), "stored upload");
        Ok(upload)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name as sent by the client.
    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed upload"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove temporary upload"
            ),
        }
    }
}
