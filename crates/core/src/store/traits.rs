//! Trait definitions for the artifact store module.

use async_trait::async_trait;
use std::path::Path;

use super::error::StoreError;

/// Default lifetime for signed read URLs.
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;

/// Durable object storage for published artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Returns the name of this store implementation.
    fn name(&self) -> &str;

    /// Uploads an in-memory buffer under the given key.
    ///
    /// Returns the key the object was stored under.
    async fn upload_buffer(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError>;

    /// Uploads a local file under the given key, inferring the
    /// content type from the key's extension.
    async fn upload_from_path(&self, path: &Path, key: &str) -> Result<(), StoreError>;

    /// Issues a time-limited read URL for a stored object.
    async fn signed_url(&self, key: &str, ttl_secs: u64) -> Result<String, StoreError>;

    /// Validates that the store is reachable and usable.
    async fn validate(&self) -> Result<(), StoreError>;
}

/// Infers a content type from a key's file extension.
///
/// Unrecognized extensions fall back to a generic binary type.
pub fn content_type_for_key(key: &str) -> &'static str {
    let extension = key.rsplit('.').next().unwrap_or("");
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "m3u8" => "application/x-mpegURL",
        "ts" => "video/MP2T",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_images() {
        assert_eq!(content_type_for_key("a/b/thumbnail.jpg"), "image/jpeg");
        assert_eq!(content_type_for_key("poster.JPEG"), "image/jpeg");
        assert_eq!(content_type_for_key("cover.png"), "image/png");
    }

    #[test]
    fn test_content_type_hls() {
        assert_eq!(
            content_type_for_key("processed/c/v/master.m3u8"),
            "application/x-mpegURL"
        );
        assert_eq!(content_type_for_key("high0.ts"), "video/MP2T");
    }

    #[test]
    fn test_content_type_source_video() {
        assert_eq!(content_type_for_key("uploads/c/clip.mp4"), "video/mp4");
    }

    #[test]
    fn test_content_type_fallback() {
        assert_eq!(content_type_for_key("raw.bin"), "application/octet-stream");
        assert_eq!(content_type_for_key("noextension"), "application/octet-stream");
        assert_eq!(content_type_for_key(""), "application/octet-stream");
    }
}
