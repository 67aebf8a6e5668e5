//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the Clipstream server:
//! - HTTP request metrics (latency, counts, errors)
//! - Pipeline pool status (collected dynamically)
//! - Video counts by status (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "clipstream_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("clipstream_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "clipstream_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics (collected dynamically)
// =============================================================================

/// Pipeline running state (1 = running, 0 = stopped).
pub static PIPELINE_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "clipstream_pipeline_running",
        "Whether the pipeline is running (1) or stopped (0)",
    )
    .unwrap()
});

/// Transcode pool active jobs.
pub static POOL_ACTIVE_JOBS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "clipstream_pool_active_jobs",
        "Number of active transcode jobs",
    )
    .unwrap()
});

/// Transcode pool queued jobs.
pub static POOL_QUEUED_JOBS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "clipstream_pool_queued_jobs",
        "Number of queued transcode jobs",
    )
    .unwrap()
});

// =============================================================================
// Video Metrics (collected dynamically)
// =============================================================================

/// Videos by current status.
pub static VIDEOS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("clipstream_videos_by_status", "Current video count by status"),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Pipeline
    registry
        .register(Box::new(PIPELINE_RUNNING.clone()))
        .unwrap();
    registry
        .register(Box::new(POOL_ACTIVE_JOBS.clone()))
        .unwrap();
    registry
        .register(Box::new(POOL_QUEUED_JOBS.clone()))
        .unwrap();

    // Videos
    registry
        .register(Box::new(VIDEOS_BY_STATUS.clone()))
        .unwrap();

    // Core metrics (jobs, encodes, thumbnails, uploads)
    for metric in clipstream_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// This is called before encoding metrics to update gauges with
/// current values from the pipeline and repository.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.pipeline().status().await;
    PIPELINE_RUNNING.set(if status.running { 1 } else { 0 });
    POOL_ACTIVE_JOBS.set(status.pool.active_jobs as i64);
    POOL_QUEUED_JOBS.set(status.pool.queued_jobs as i64);

    for video_status in ["uploading", "ready", "failed"] {
        let filter = clipstream_core::VideoFilter::new().with_status(video_status);
        if let Ok(count) = state.repository().count(&filter) {
            VIDEOS_BY_STATUS
                .with_label_values(&[video_status])
                .set(count);
        }
    }
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let uuid_regex = regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap();
    let numeric_regex = regex_lite::Regex::new(r"/\d+(/|$)").unwrap();

    let result = uuid_regex.replace_all(path, "{id}");
    let result = numeric_regex.replace_all(&result, "/{id}$1");
    result.to_string()
}
