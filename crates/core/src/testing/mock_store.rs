//! Mock artifact store for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::store::{content_type_for_key, ArtifactStore, StoreError};

/// A recorded upload for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub key: String,
    pub content_type: String,
    pub size_bytes: u64,
}

/// Mock implementation of the ArtifactStore trait.
///
/// Records uploads in memory and supports failing all uploads or only
/// the ones whose key matches a substring, which is how the thumbnail
/// soft-fail path gets exercised.
pub struct MockStore {
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    fail_all: Arc<RwLock<bool>>,
    fail_keys_containing: Arc<RwLock<Option<String>>>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Create a new mock store.
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(RwLock::new(Vec::new())),
            fail_all: Arc::new(RwLock::new(false)),
            fail_keys_containing: Arc::new(RwLock::new(None)),
        }
    }

    /// Fail every upload.
    pub async fn set_fail_all(&self, fail: bool) {
        *self.fail_all.write().await = fail;
    }

    /// Fail uploads whose key contains the given substring.
    pub async fn set_fail_matching(&self, substring: impl Into<String>) {
        *self.fail_keys_containing.write().await = Some(substring.into());
    }

    /// Get all recorded uploads.
    pub async fn recorded_uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }

    /// Get the keys of all recorded uploads.
    pub async fn uploaded_keys(&self) -> Vec<String> {
        self.uploads.read().await.iter().map(|u| u.key.clone()).collect()
    }

    /// Get the number of recorded uploads.
    pub async fn upload_count(&self) -> usize {
        self.uploads.read().await.len()
    }

    async fn check_rejection(&self, key: &str) -> Result<(), StoreError> {
        if *self.fail_all.read().await {
            return Err(StoreError::upload_failed(key, "mock store failing all uploads"));
        }
        if let Some(substring) = self.fail_keys_containing.read().await.as_ref() {
            if key.contains(substring.as_str()) {
                return Err(StoreError::upload_failed(key, "mock store failing matching keys"));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for MockStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upload_buffer(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError> {
        self.check_rejection(key).await?;

        self.uploads.write().await.push(RecordedUpload {
            key: key.to_string(),
            content_type: content_type.to_string(),
            size_bytes: bytes.len() as u64,
        });
        Ok(key.to_string())
    }

    async fn upload_from_path(&self, path: &Path, key: &str) -> Result<(), StoreError> {
        self.check_rejection(key).await?;

        let metadata = tokio::fs::metadata(path).await.map_err(|_| StoreError::FileNotFound {
            path: path.to_path_buf(),
        })?;

        self.uploads.write().await.push(RecordedUpload {
            key: key.to_string(),
            content_type: content_type_for_key(key).to_string(),
            size_bytes: metadata.len(),
        });
        Ok(())
    }

    async fn signed_url(&self, key: &str, ttl_secs: u64) -> Result<String, StoreError> {
        Ok(format!(
            "https://test-bucket.example.com/{}?expires={}",
            key, ttl_secs
        ))
    }

    async fn validate(&self) -> Result<(), StoreError> {
        if *self.fail_all.read().await {
            return Err(StoreError::BucketUnavailable {
                bucket: "test-bucket".to_string(),
                reason: "mock store failing all uploads".to_string(),
            });
        }
        Ok(())
    }
}
