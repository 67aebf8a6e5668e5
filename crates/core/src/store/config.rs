//! Configuration for the artifact store.

use serde::{Deserialize, Serialize};

/// Configuration for the S3-backed artifact store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket holding published artifacts.
    pub bucket: String,

    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom endpoint URL, for MinIO-style S3 compatibles.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Use path-style addressing (required by most S3 compatibles).
    #[serde(default)]
    pub force_path_style: bool,

    /// Lifetime of signed read URLs in seconds.
    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_secs: u64,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_signed_url_ttl() -> u64 {
    3600
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "clipstream-media".to_string(),
            region: default_region(),
            endpoint: None,
            force_path_style: false,
            signed_url_ttl_secs: default_signed_url_ttl(),
        }
    }
}

impl StorageConfig {
    /// Creates a config for the given bucket.
    pub fn for_bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Sets a custom endpoint with path-style addressing.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self.force_path_style = true;
        self
    }
}
