//! Video repository trait and supporting types.

use thiserror::Error;

use super::types::{NewVideo, Video};

/// Error type for repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Video not found.
    #[error("Video not found: {0}")]
    NotFound(String),

    /// The record is already in a terminal status.
    #[error("Cannot {operation} video {video_id}: current status is {current_status}")]
    InvalidStatus {
        video_id: String,
        current_status: String,
        operation: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Filter for querying video records.
#[derive(Debug, Clone)]
pub struct VideoFilter {
    /// Filter by status string.
    pub status: Option<String>,
    /// Filter by owning channel.
    pub channel_id: Option<String>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl Default for VideoFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            status: None,
            channel_id: None,
            limit: 100,
            offset: 0,
        }
    }

    /// Filter by status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Filter by channel.
    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    /// Set limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for video record storage backends.
///
/// The terminal writes enforce the status machine: `mark_ready` and
/// `mark_failed` only apply to records still in `uploading`, so at
/// most one terminal write ever succeeds per record.
pub trait VideoRepository: Send + Sync {
    /// Create a new record in the uploading state.
    fn create(&self, request: NewVideo) -> Result<Video, RepositoryError>;

    /// Get a record by ID.
    fn get(&self, id: &str) -> Result<Option<Video>, RepositoryError>;

    /// List records matching the filter.
    fn list(&self, filter: &VideoFilter) -> Result<Vec<Video>, RepositoryError>;

    /// Count records matching the filter.
    fn count(&self, filter: &VideoFilter) -> Result<i64, RepositoryError>;

    /// Transition uploading -> ready, setting the published fields
    /// atomically with the status.
    fn mark_ready(
        &self,
        id: &str,
        processed_prefix: &str,
        thumbnail_key: Option<&str>,
        duration_secs: f64,
    ) -> Result<Video, RepositoryError>;

    /// Transition uploading -> failed, setting the error message
    /// atomically with the status.
    fn mark_failed(&self, id: &str, message: &str) -> Result<Video, RepositoryError>;
}
