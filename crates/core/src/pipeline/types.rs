//! Pipeline job and status types.

use serde::{Deserialize, Serialize};

/// Input contract for one transcode job.
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// The owning video record, already created in the uploading state.
    pub video_id: String,
    /// The owning channel; namespaces all local and published paths.
    pub channel_id: String,
    /// The raw uploaded bytes.
    pub raw_bytes: Vec<u8>,
    /// The client-supplied filename, used for the staged file.
    pub original_filename: String,
}

/// Status of the worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatus {
    pub workers: usize,
    pub active_jobs: usize,
    pub queued_jobs: usize,
    pub total_processed: u64,
    pub total_failed: u64,
}

/// Overall pipeline status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub running: bool,
    pub pool: PoolStatus,
    /// Video IDs currently being processed.
    pub active_videos: Vec<String>,
}
