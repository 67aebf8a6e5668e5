//! Video record types and the status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a video record.
///
/// Transitions are monotonic and terminal: `Uploading -> Ready` or
/// `Uploading -> Failed`, nothing else. A record in a terminal state
/// is never rewritten by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Uploading,
    Ready,
    Failed,
}

impl VideoStatus {
    /// The status as its storage/wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Uploading => "uploading",
            VideoStatus::Ready => "ready",
            VideoStatus::Failed => "failed",
        }
    }

    /// Parses a storage string back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "uploading" => Some(VideoStatus::Uploading),
            "ready" => Some(VideoStatus::Ready),
            "failed" => Some(VideoStatus::Failed),
            _ => None,
        }
    }

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Ready | VideoStatus::Failed)
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted video record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    /// Owning channel.
    pub channel_id: String,
    pub category_id: Option<String>,
    pub title: String,
    pub description: String,
    /// Object-store key of the raw upload.
    pub original_key: String,
    /// Key prefix of the published renditions; set iff status is ready.
    pub processed_prefix: Option<String>,
    /// Key of the published thumbnail, when one was uploaded.
    pub thumbnail_key: Option<String>,
    /// Probed duration in seconds; set iff status is ready.
    pub duration_secs: Option<f64>,
    pub status: VideoStatus,
    /// Set iff status is failed.
    pub error_message: Option<String>,
    pub views: i64,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new record in the uploading state.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub channel_id: String,
    pub category_id: Option<String>,
    pub title: String,
    pub description: String,
    pub original_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            VideoStatus::Uploading,
            VideoStatus::Ready,
            VideoStatus::Failed,
        ] {
            assert_eq!(VideoStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(VideoStatus::parse("processing"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!VideoStatus::Uploading.is_terminal());
        assert!(VideoStatus::Ready.is_terminal());
        assert!(VideoStatus::Failed.is_terminal());
    }
}
