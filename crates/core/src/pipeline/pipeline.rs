//! The transcode pipeline: a bounded worker pool owning the
//! end-to-end job from staged upload to finalized record.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::metrics;
use crate::repository::{VideoRepository, VideoStatus};
use crate::store::ArtifactStore;
use crate::transcoder::{Transcoder, THUMBNAIL_NAME};

use super::config::PipelineConfig;
use super::types::{JobRequest, PipelineStatus, PoolStatus};

/// Error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Pipeline is not running.
    #[error("Pipeline is not running")]
    NotRunning,

    /// The job queue is at capacity.
    #[error("Job queue is full")]
    QueueFull,

    /// Failed to stage the raw upload on local disk.
    #[error("Staging failed: {0}")]
    StagingFailed(String),

    /// The transcode engine hard-failed.
    #[error("Encode failed: {0}")]
    EncodeFailed(String),

    /// Publishing rendition artifacts failed.
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// The record write failed.
    #[error("Repository error: {0}")]
    Repository(String),
}

/// Tracks statistics for the worker pool.
///
/// The active count is not tracked here; it is derived from the
/// active-job set so the two cannot drift apart.
struct PoolStats {
    queued: AtomicU64,
    total_processed: AtomicU64,
    total_failed: AtomicU64,
}

impl Default for PoolStats {
    fn default() -> Self {
        Self {
            queued: AtomicU64::new(0),
            total_processed: AtomicU64::new(0),
            total_failed: AtomicU64::new(0),
        }
    }
}

impl PoolStats {
    fn to_status(&self, workers: usize, active_jobs: usize) -> PoolStatus {
        PoolStatus {
            workers,
            active_jobs,
            queued_jobs: self.queued.load(Ordering::Relaxed) as usize,
            total_processed: self.total_processed.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
        }
    }
}

/// Fields carried into the ready-transition write.
struct ReadyOutcome {
    processed_prefix: String,
    thumbnail_key: Option<String>,
    duration_secs: f64,
}

/// The transcode pipeline.
///
/// Jobs enter through a bounded queue and are drained by a fixed set
/// of workers, so an upload burst cannot start an unbounded number of
/// encoder processes. A failure in one job never propagates to other
/// jobs or the host process.
pub struct VideoPipeline {
    config: PipelineConfig,
    transcoder: Arc<dyn Transcoder>,
    store: Arc<dyn ArtifactStore>,
    repository: Arc<dyn VideoRepository>,
    queue_tx: mpsc::Sender<JobRequest>,
    queue_rx: Arc<Mutex<mpsc::Receiver<JobRequest>>>,
    stats: Arc<PoolStats>,
    active_jobs: Arc<RwLock<HashSet<String>>>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    worker_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl VideoPipeline {
    /// Creates a new pipeline. Call [`start`](Self::start) to spawn workers.
    pub fn new(
        config: PipelineConfig,
        transcoder: Arc<dyn Transcoder>,
        store: Arc<dyn ArtifactStore>,
        repository: Arc<dyn VideoRepository>,
    ) -> Self {
        let (queue_tx, queue_rx) = mpsc::channel(config.queue_size.max(1));
        let (shutdown_tx, _) = broadcast::channel(4);

        Self {
            config,
            transcoder,
            store,
            repository,
            queue_tx,
            queue_rx: Arc::new(Mutex::new(queue_rx)),
            stats: Arc::new(PoolStats::default()),
            active_jobs: Arc::new(RwLock::new(HashSet::new())),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            worker_handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawns the worker tasks.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut handles = self.worker_handles.lock().await;
        for worker_id in 0..self.config.workers {
            let queue_rx = Arc::clone(&self.queue_rx);
            let transcoder = Arc::clone(&self.transcoder);
            let store = Arc::clone(&self.store);
            let repository = Arc::clone(&self.repository);
            let stats = Arc::clone(&self.stats);
            let active_jobs = Arc::clone(&self.active_jobs);
            let config = self.config.clone();
            let mut shutdown_rx = self.shutdown_tx.subscribe();

            handles.push(tokio::spawn(async move {
                tracing::debug!(worker_id, "pipeline worker started");
                loop {
                    let job = tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        job = Self::next_job(&queue_rx) => job,
                    };

                    let Some(job) = job else { break };

                    stats.queued.fetch_sub(1, Ordering::Relaxed);
                    {
                        let mut active = active_jobs.write().await;
                        active.insert(job.video_id.clone());
                    }

                    let video_id = job.video_id.clone();
                    let succeeded = Self::run_job(
                        job,
                        &config,
                        Arc::clone(&transcoder),
                        Arc::clone(&store),
                        Arc::clone(&repository),
                    )
                    .await;

                    {
                        let mut active = active_jobs.write().await;
                        active.remove(&video_id);
                    }
                    if succeeded {
                        stats.total_processed.fetch_add(1, Ordering::Relaxed);
                    } else {
                        stats.total_failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
                tracing::debug!(worker_id, "pipeline worker stopped");
            }));
        }
    }

    /// Signals workers to stop and waits for them to finish their
    /// current jobs.
    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());

        let mut handles = self.worker_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
    }

    /// Submits a job without blocking.
    ///
    /// Rejects with [`PipelineError::QueueFull`] when the queue is at
    /// capacity; the caller is expected to surface backpressure.
    pub fn submit(&self, job: JobRequest) -> Result<(), PipelineError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(PipelineError::NotRunning);
        }

        match self.queue_tx.try_send(job) {
            Ok(()) => {
                self.stats.queued.fetch_add(1, Ordering::Relaxed);
                metrics::JOBS_SUBMITTED.inc();
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                metrics::JOBS_REJECTED.inc();
                Err(PipelineError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(PipelineError::NotRunning),
        }
    }

    /// Returns the current pipeline status.
    ///
    /// The active-job count comes from the same snapshot as the
    /// active video IDs, taken under a single lock.
    pub async fn status(&self) -> PipelineStatus {
        let active_videos: Vec<String> =
            self.active_jobs.read().await.iter().cloned().collect();

        PipelineStatus {
            running: self.running.load(Ordering::SeqCst),
            pool: self
                .stats
                .to_status(self.config.workers, active_videos.len()),
            active_videos,
        }
    }

    /// Requeues jobs whose staging workspaces survived a restart.
    ///
    /// A workspace whose record is still uploading and whose raw file
    /// is readable goes back on the queue; anything else is failed
    /// and removed. Returns how many jobs were requeued.
    pub async fn recover_staged_jobs(&self) -> usize {
        let mut requeued = 0;

        let mut channels = match tokio::fs::read_dir(&self.config.staging_root).await {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        while let Ok(Some(channel_entry)) = channels.next_entry().await {
            let is_dir = channel_entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }
            let channel_id = channel_entry.file_name().to_string_lossy().to_string();

            let mut videos = match tokio::fs::read_dir(channel_entry.path()).await {
                Ok(entries) => entries,
                Err(_) => continue,
            };

            while let Ok(Some(video_entry)) = videos.next_entry().await {
                let is_dir = video_entry
                    .file_type()
                    .await
                    .map(|t| t.is_dir())
                    .unwrap_or(false);
                if !is_dir {
                    continue;
                }
                let video_id = video_entry.file_name().to_string_lossy().to_string();

                let still_uploading = matches!(
                    self.repository.get(&video_id),
                    Ok(Some(video)) if video.status == VideoStatus::Uploading
                );

                if still_uploading {
                    if let Some((filename, bytes)) =
                        Self::read_staged_file(&video_entry.path()).await
                    {
                        let job = JobRequest {
                            video_id: video_id.clone(),
                            channel_id: channel_id.clone(),
                            raw_bytes: bytes,
                            original_filename: filename,
                        };
                        if self.submit(job).is_ok() {
                            tracing::info!(video_id, "requeued staged job after restart");
                            requeued += 1;
                            continue;
                        }
                    }

                    tracing::warn!(video_id, "could not requeue staged job, failing record");
                    let _ = self
                        .repository
                        .mark_failed(&video_id, "process restarted during processing");
                }

                let _ = tokio::fs::remove_dir_all(video_entry.path()).await;
            }
        }

        requeued
    }

    async fn next_job(queue_rx: &Arc<Mutex<mpsc::Receiver<JobRequest>>>) -> Option<JobRequest> {
        queue_rx.lock().await.recv().await
    }

    /// Reads the first regular file in a staging workspace.
    async fn read_staged_file(dir: &Path) -> Option<(String, Vec<u8>)> {
        let mut entries = tokio::fs::read_dir(dir).await.ok()?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if is_file {
                let filename = entry.file_name().to_string_lossy().to_string();
                let bytes = tokio::fs::read(entry.path()).await.ok()?;
                return Some((filename, bytes));
            }
        }
        None
    }

    /// Runs one job end to end: stage, transcode, publish, finalize,
    /// clean up. Returns whether the job reached the ready state.
    ///
    /// This is the per-job catch-all boundary: every exit path writes
    /// at most one terminal status and always runs cleanup.
    async fn run_job(
        job: JobRequest,
        config: &PipelineConfig,
        transcoder: Arc<dyn Transcoder>,
        store: Arc<dyn ArtifactStore>,
        repository: Arc<dyn VideoRepository>,
    ) -> bool {
        let start = Instant::now();
        let staging_dir = config
            .staging_root
            .join(&job.channel_id)
            .join(&job.video_id);
        let mut rendition_dir = config
            .output_root
            .join(&job.channel_id)
            .join(&job.video_id);

        tracing::info!(
            video_id = %job.video_id,
            channel_id = %job.channel_id,
            "transcode job started"
        );

        let outcome =
            Self::execute(&job, &staging_dir, &mut rendition_dir, &*transcoder, &*store).await;

        let finalized = match outcome {
            Ok(ready) => repository
                .mark_ready(
                    &job.video_id,
                    &ready.processed_prefix,
                    ready.thumbnail_key.as_deref(),
                    ready.duration_secs,
                )
                .map(|_| ())
                .map_err(|e| PipelineError::Repository(e.to_string())),
            Err(e) => Err(e),
        };

        let succeeded = match finalized {
            Ok(()) => {
                metrics::JOBS_COMPLETED.inc();
                tracing::info!(
                    video_id = %job.video_id,
                    elapsed_secs = start.elapsed().as_secs(),
                    "transcode job completed"
                );
                true
            }
            Err(e) => {
                metrics::JOBS_FAILED.inc();
                tracing::warn!(video_id = %job.video_id, error = %e, "transcode job failed");
                if let Err(write_err) = repository.mark_failed(&job.video_id, &e.to_string()) {
                    tracing::error!(
                        video_id = %job.video_id,
                        error = %write_err,
                        "failed to record job failure"
                    );
                }
                false
            }
        };

        metrics::JOB_DURATION.observe(start.elapsed().as_secs_f64());

        // Unconditional: both job directories go away whatever the
        // outcome, and a removal error never changes it.
        cleanup_job_dirs(&staging_dir, &rendition_dir).await;

        succeeded
    }

    /// Steps 1-4 of the job: stage, transcode, publish renditions,
    /// publish thumbnail.
    ///
    /// `rendition_dir` is updated as soon as the transcoder reports
    /// its output directory so cleanup covers it on later failures.
    async fn execute(
        job: &JobRequest,
        staging_dir: &Path,
        rendition_dir: &mut PathBuf,
        transcoder: &dyn Transcoder,
        store: &dyn ArtifactStore,
    ) -> Result<ReadyOutcome, PipelineError> {
        // Step 1: stage the raw bytes.
        tokio::fs::create_dir_all(staging_dir)
            .await
            .map_err(|e| PipelineError::StagingFailed(e.to_string()))?;
        let staged_path = staging_dir.join(&job.original_filename);
        tokio::fs::write(&staged_path, &job.raw_bytes)
            .await
            .map_err(|e| PipelineError::StagingFailed(e.to_string()))?;

        // Step 2: transcode.
        let encode_start = Instant::now();
        let output = transcoder
            .process(&staged_path, &job.channel_id, &job.video_id)
            .await
            .map_err(|e| PipelineError::EncodeFailed(e.to_string()))?;
        metrics::ENCODE_DURATION.observe(encode_start.elapsed().as_secs_f64());
        *rendition_dir = output.rendition_dir.clone();

        // Step 3: publish every regular file in the rendition
        // directory. A missing directory is a hard failure.
        let prefix = format!("processed/{}/{}", job.channel_id, job.video_id);
        let mut entries = tokio::fs::read_dir(&output.rendition_dir).await.map_err(|_| {
            PipelineError::EncodeFailed(format!(
                "rendition output directory missing: {}",
                output.rendition_dir.display()
            ))
        })?;

        let mut uploaded = 0usize;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PipelineError::UploadFailed(e.to_string()))?
        {
            let is_file = entry
                .file_type()
                .await
                .map_err(|e| PipelineError::UploadFailed(e.to_string()))?
                .is_file();
            if !is_file {
                continue;
            }

            let filename = entry.file_name().to_string_lossy().to_string();
            // The thumbnail goes through its own soft-fail publish below.
            if filename == THUMBNAIL_NAME {
                continue;
            }
            let key = format!("{}/{}", prefix, filename);
            store
                .upload_from_path(&entry.path(), &key)
                .await
                .map_err(|e| PipelineError::UploadFailed(e.to_string()))?;
            metrics::ARTIFACTS_UPLOADED.inc();
            uploaded += 1;
        }
        tracing::debug!(video_id = %job.video_id, uploaded, "rendition artifacts published");

        // Step 4: publish the thumbnail. This single upload is
        // soft-fail: the job still completes as ready without a
        // thumbnail key.
        let mut thumbnail_key = None;
        if let Some(thumbnail_path) = &output.thumbnail_path {
            if thumbnail_path.exists() {
                let key = format!("{}/{}", prefix, THUMBNAIL_NAME);
                match store.upload_from_path(thumbnail_path, &key).await {
                    Ok(()) => thumbnail_key = Some(key),
                    Err(e) => {
                        metrics::THUMBNAIL_UPLOADS_SOFT_FAILED.inc();
                        tracing::warn!(
                            video_id = %job.video_id,
                            error = %e,
                            "thumbnail upload failed, completing without thumbnail"
                        );
                    }
                }
            }
        }

        Ok(ReadyOutcome {
            processed_prefix: prefix,
            thumbnail_key,
            duration_secs: output.duration_secs,
        })
    }
}

/// Removes both job directories from local disk.
///
/// Idempotent: already-missing directories are not an error, and any
/// other removal error is logged without escalating.
pub async fn cleanup_job_dirs(staging_dir: &Path, rendition_dir: &Path) {
    for dir in [staging_dir, rendition_dir] {
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "failed to remove job directory");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SqliteVideoRepository;
    use crate::testing::{MockStore, MockTranscoder};

    fn pipeline_with(config: PipelineConfig) -> VideoPipeline {
        let repository = Arc::new(SqliteVideoRepository::in_memory().unwrap());
        VideoPipeline::new(
            config,
            Arc::new(MockTranscoder::new()),
            Arc::new(MockStore::new()),
            repository,
        )
    }

    fn job(video_id: &str) -> JobRequest {
        JobRequest {
            video_id: video_id.to_string(),
            channel_id: "chan-1".to_string(),
            raw_bytes: vec![0u8; 16],
            original_filename: "clip.mp4".to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_before_start_rejected() {
        let pipeline = pipeline_with(PipelineConfig::default());
        let result = pipeline.submit(job("vid-1"));
        assert!(matches!(result, Err(PipelineError::NotRunning)));
    }

    #[tokio::test]
    async fn test_submit_full_queue_rejected() {
        // No workers draining, capacity one: second submission is
        // backpressure, not a blocked caller.
        let pipeline = pipeline_with(
            PipelineConfig::default()
                .with_workers(0)
                .with_queue_size(1),
        );
        pipeline.start().await;

        assert!(pipeline.submit(job("vid-1")).is_ok());
        let result = pipeline.submit(job("vid-2"));
        assert!(matches!(result, Err(PipelineError::QueueFull)));
    }

    #[tokio::test]
    async fn test_status_reports_queue_depth() {
        let pipeline = pipeline_with(
            PipelineConfig::default()
                .with_workers(0)
                .with_queue_size(8),
        );
        pipeline.start().await;
        pipeline.submit(job("vid-1")).unwrap();
        pipeline.submit(job("vid-2")).unwrap();

        let status = pipeline.status().await;
        assert!(status.running);
        assert_eq!(status.pool.queued_jobs, 2);
        // Active count is derived from the active set, so the two
        // always agree.
        assert_eq!(status.pool.active_jobs, status.active_videos.len());
        assert_eq!(status.pool.active_jobs, 0);
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("staging");
        let renditions = dir.path().join("renditions");
        tokio::fs::create_dir_all(&staging).await.unwrap();
        tokio::fs::create_dir_all(&renditions).await.unwrap();

        cleanup_job_dirs(&staging, &renditions).await;
        assert!(!staging.exists());
        assert!(!renditions.exists());

        // Second invocation over missing paths must not panic.
        cleanup_job_dirs(&staging, &renditions).await;
    }

    #[tokio::test]
    async fn test_cleanup_with_coinciding_paths() {
        let dir = tempfile::tempdir().unwrap();
        let shared = dir.path().join("shared");
        tokio::fs::create_dir_all(&shared).await.unwrap();

        cleanup_job_dirs(&shared, &shared).await;
        assert!(!shared.exists());
    }
}
