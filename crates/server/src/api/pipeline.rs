//! Pipeline API endpoints.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

/// Response for pipeline status endpoint.
#[derive(Debug, Serialize)]
pub struct PipelineStatusResponse {
    /// Whether the pipeline is running.
    pub running: bool,
    /// Worker pool status.
    pub pool: PoolStatusResponse,
    /// Videos currently being processed.
    pub active_videos: Vec<String>,
}

/// Pool status in response.
#[derive(Debug, Serialize)]
pub struct PoolStatusResponse {
    /// Number of worker tasks.
    pub workers: usize,
    /// Number of active jobs.
    pub active_jobs: usize,
    /// Number of queued jobs.
    pub queued_jobs: usize,
    /// Total jobs processed since startup.
    pub total_processed: u64,
    /// Total jobs failed since startup.
    pub total_failed: u64,
}

/// Get pipeline status.
///
/// Returns the current status of the transcode pipeline including
/// worker pool statistics and in-flight video IDs.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<PipelineStatusResponse> {
    let status = state.pipeline().status().await;

    Json(PipelineStatusResponse {
        running: status.running,
        pool: PoolStatusResponse {
            workers: status.pool.workers,
            active_jobs: status.pool.active_jobs,
            queued_jobs: status.pool.queued_jobs,
            total_processed: status.pool.total_processed,
            total_failed: status.pool.total_failed,
        },
        active_videos: status.active_videos,
    })
}
