//! Error types for the artifact store module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while talking to the object store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Local file to upload was not found.
    #[error("Local file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Upload of an object failed.
    #[error("Upload failed for key {key}: {reason}")]
    UploadFailed { key: String, reason: String },

    /// Signed URL generation failed.
    #[error("Failed to sign URL for key {key}: {reason}")]
    SignedUrlFailed { key: String, reason: String },

    /// The configured bucket is unreachable or missing.
    #[error("Bucket {bucket} unavailable: {reason}")]
    BucketUnavailable { bucket: String, reason: String },

    /// I/O error while reading local artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Creates an upload failed error.
    pub fn upload_failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UploadFailed {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Creates a signed URL error.
    pub fn signed_url_failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SignedUrlFailed {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
