//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Pipeline jobs (submissions, outcomes, durations)
//! - Encode runs
//! - Thumbnail fallback chain
//! - Artifact uploads

use once_cell::sync::Lazy;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts,
};

// =============================================================================
// Pipeline Job Metrics
// =============================================================================

/// Jobs accepted into the queue.
pub static JOBS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipstream_jobs_submitted_total",
        "Total transcode jobs accepted into the queue",
    )
    .unwrap()
});

/// Jobs rejected because the queue was full.
pub static JOBS_REJECTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipstream_jobs_rejected_total",
        "Total transcode jobs rejected due to a full queue",
    )
    .unwrap()
});

/// Jobs that reached the ready state.
pub static JOBS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipstream_jobs_completed_total",
        "Total transcode jobs completed successfully",
    )
    .unwrap()
});

/// Jobs that reached the failed state.
pub static JOBS_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipstream_jobs_failed_total",
        "Total transcode jobs that hard-failed",
    )
    .unwrap()
});

/// End-to-end job duration in seconds.
pub static JOB_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "clipstream_job_duration_seconds",
            "End-to-end duration of transcode jobs",
        )
        .buckets(vec![
            1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0,
        ]),
    )
    .unwrap()
});

// =============================================================================
// Encode Metrics
// =============================================================================

/// Encode duration in seconds.
pub static ENCODE_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "clipstream_encode_duration_seconds",
            "Duration of rendition encode runs",
        )
        .buckets(vec![
            1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0,
        ]),
    )
    .unwrap()
});

// =============================================================================
// Thumbnail Metrics
// =============================================================================

/// Which fallback strategy produced the thumbnail.
pub static THUMBNAIL_STRATEGY_USED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "clipstream_thumbnail_strategy_total",
            "Thumbnails produced, by fallback strategy",
        ),
        &["strategy"], // "midpoint_frame", "first_frame", "placeholder"
    )
    .unwrap()
});

/// Thumbnail uploads that soft-failed.
pub static THUMBNAIL_UPLOADS_SOFT_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipstream_thumbnail_uploads_soft_failed_total",
        "Thumbnail uploads that failed without failing the job",
    )
    .unwrap()
});

// =============================================================================
// Upload Metrics
// =============================================================================

/// Artifacts uploaded to the object store.
pub static ARTIFACTS_UPLOADED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipstream_artifacts_uploaded_total",
        "Total rendition artifacts uploaded",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_REJECTED.clone()),
        Box::new(JOBS_COMPLETED.clone()),
        Box::new(JOBS_FAILED.clone()),
        Box::new(JOB_DURATION.clone()),
        // Encode
        Box::new(ENCODE_DURATION.clone()),
        // Thumbnails
        Box::new(THUMBNAIL_STRATEGY_USED.clone()),
        Box::new(THUMBNAIL_UPLOADS_SOFT_FAILED.clone()),
        // Uploads
        Box::new(ARTIFACTS_UPLOADED.clone()),
    ]
}
