//! Pipeline status endpoint integration tests.

mod common;

use axum::http::StatusCode;
use common::{TestConfig, TestFixture};

#[tokio::test]
async fn test_pipeline_status_reports_running_pool() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/pipeline/status").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["running"], true);
    assert_eq!(response.body["pool"]["workers"], 2);
    assert_eq!(response.body["pool"]["active_jobs"], 0);
    assert_eq!(response.body["pool"]["queued_jobs"], 0);
    assert!(response.body["active_videos"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_pipeline_status_counts_processed_jobs() {
    let fixture = TestFixture::new().await;

    let uploaded = fixture.upload("chan-1", "clip.mp4", b"raw bytes").await;
    assert_eq!(uploaded.status, StatusCode::ACCEPTED);
    let video_id = uploaded.body["id"].as_str().unwrap().to_string();

    fixture.wait_for_terminal(&video_id).await;

    // The worker bumps its counters right after the terminal write.
    let mut processed = 0;
    for _ in 0..40 {
        let response = fixture.get("/api/v1/pipeline/status").await;
        processed = response.body["pool"]["total_processed"].as_u64().unwrap();
        if processed == 1 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }
    assert_eq!(processed, 1);
}

#[tokio::test]
async fn test_custom_worker_count_reported() {
    let fixture = TestFixture::with_config(TestConfig {
        workers: 4,
        queue_size: 8,
    })
    .await;

    let response = fixture.get("/api/v1/pipeline/status").await;
    assert_eq!(response.body["pool"]["workers"], 4);
}
