//! S3-backed artifact store implementation.
//!
//! Works against AWS proper or any path-style S3 compatible when a
//! custom endpoint is configured.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use std::time::Duration;

use super::config::StorageConfig;
use super::error::StoreError;
use super::traits::{content_type_for_key, ArtifactStore};

/// S3-backed artifact store.
pub struct S3Store {
    client: Client,
    config: StorageConfig,
}

impl S3Store {
    /// Creates a store from the given configuration, resolving
    /// credentials from the default AWS provider chain.
    pub async fn new(config: StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            config,
        }
    }

    /// The configured bucket name.
    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }
}

#[async_trait]
impl ArtifactStore for S3Store {
    fn name(&self) -> &str {
        "s3"
    }

    async fn upload_buffer(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StoreError::upload_failed(key, e.to_string()))?;

        Ok(key.to_string())
    }

    async fn upload_from_path(&self, path: &Path, key: &str) -> Result<(), StoreError> {
        if !path.exists() {
            return Err(StoreError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StoreError::upload_failed(key, e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type_for_key(key))
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::upload_failed(key, e.to_string()))?;

        Ok(())
    }

    async fn signed_url(&self, key: &str, ttl_secs: u64) -> Result<String, StoreError> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(ttl_secs))
            .map_err(|e| StoreError::signed_url_failed(key, e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StoreError::signed_url_failed(key, e.to_string()))?;

        Ok(request.uri().to_string())
    }

    async fn validate(&self) -> Result<(), StoreError> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|e| StoreError::BucketUnavailable {
                bucket: self.config.bucket.clone(),
                reason: e.to_string(),
            })?;

        Ok(())
    }
}
