//! Uploaded images spooled to disk while the form is parsed.

use std::io;
use std::path::Path;

use axum::extract::multipart::{Field, MultipartError};
use tempfile::TempPath;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum SpoolError {
    #[error("{0}")]
    Form(#[from] MultipartError),

    #[error("Failed to store upload: {0}")]
    Io(#[from] io::Error),
}

/// An uploaded file held in a named temp file for one request.
///
/// The file is removed by [`SpooledImage::discard`] or, failing that, on drop.
#[derive(Debug)]
pub struct SpooledImage {
    path: TempPath,
    len: u64,
}

impl SpooledImage {
    /// Stream a multipart field into a new temp file under `dir`.
    pub async fn from_field(mut field: Field<'_>, dir: &Path) -> Result<Self, SpoolError> {
        let (file, path) = tempfile::Builder::new()
            .prefix("upscale-")
            .suffix(".upload")
            .tempfile_in(dir)?
            .into_parts();

        let mut file = tokio::fs::File::from_std(file);
        let mut len = 0u64;
        while let Some(chunk) = field.chunk().await? {
            len += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(Self { path, len })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    /// Remove the temp file. Best effort: failures are only logged.
    pub fn discard(self) {
        let shown = self.path.display().to_string();
        if let Err(e) = self.path.close() {
            tracing::debug!(path = %shown, error = %e, "Failed to remove spooled upload");
        }
    }
}
