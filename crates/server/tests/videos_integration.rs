//! Video API integration tests: upload, detail, listing.

mod common;

use axum::http::StatusCode;
use common::{TestConfig, TestFixture};

#[tokio::test]
async fn test_upload_accepted_and_processed() {
    let fixture = TestFixture::new().await;

    let response = fixture.upload("chan-1", "clip.mp4", b"raw video bytes").await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.body["status"], "uploading");
    assert_eq!(response.body["channel_id"], "chan-1");
    let video_id = response.body["id"].as_str().unwrap().to_string();

    let done = fixture.wait_for_terminal(&video_id).await;
    assert_eq!(done.body["status"], "ready");
    assert_eq!(
        done.body["processed_prefix"],
        format!("processed/chan-1/{}", video_id)
    );
    assert_eq!(done.body["duration_secs"], 15.0);

    // Ready videos carry signed playback URLs.
    let master_url = done.body["playback"]["master_url"].as_str().unwrap();
    assert!(master_url.contains("master.m3u8"));
    let thumbnail_url = done.body["playback"]["thumbnail_url"].as_str().unwrap();
    assert!(thumbnail_url.contains("thumbnail.jpg"));
}

#[tokio::test]
async fn test_upload_publishes_raw_object() {
    let fixture = TestFixture::new().await;

    let response = fixture.upload("chan-1", "clip.mp4", b"raw video bytes").await;
    assert_eq!(response.status, StatusCode::ACCEPTED);

    // The raw bytes land in the object store before the job runs, so
    // the record's original key names a stored object.
    let uploads = fixture.store.recorded_uploads().await;
    let raw = uploads
        .iter()
        .find(|u| u.key == "uploads/chan-1/clip.mp4")
        .expect("raw upload not published");
    assert_eq!(raw.content_type, "video/mp4");
    assert_eq!(raw.size_bytes, b"raw video bytes".len() as u64);
}

#[tokio::test]
async fn test_upload_rejected_when_raw_store_fails() {
    let fixture = TestFixture::new().await;
    fixture.store.set_fail_matching("uploads/").await;

    let response = fixture.upload("chan-1", "clip.mp4", b"bytes").await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("Failed to store upload"));

    // No record exists for a raw upload that never landed.
    let listing = fixture.get("/api/v1/videos").await;
    assert_eq!(listing.body["total"], 0);
}

#[tokio::test]
async fn test_upload_uses_filename_as_default_title() {
    let fixture = TestFixture::new().await;

    let response = fixture.upload("chan-1", "holiday.mp4", b"bytes").await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.body["title"], "holiday.mp4");
}

#[tokio::test]
async fn test_upload_with_metadata_fields() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .upload_with_fields(
            &[
                ("channel_id", "chan-1"),
                ("title", "My clip"),
                ("description", "A test clip"),
                ("category_id", "sports"),
            ],
            Some(("clip.mp4", b"bytes")),
        )
        .await;

    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.body["title"], "My clip");
    assert_eq!(response.body["description"], "A test clip");
    assert_eq!(response.body["category_id"], "sports");
}

#[tokio::test]
async fn test_upload_without_file_is_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .upload_with_fields(&[("channel_id", "chan-1")], None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("file field"));
}

#[tokio::test]
async fn test_upload_without_channel_is_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .upload_with_fields(&[], Some(("clip.mp4", b"bytes")))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("channel_id"));
}

#[tokio::test]
async fn test_upload_rejected_when_queue_full() {
    // No workers draining and a single queue slot.
    let fixture = TestFixture::with_config(TestConfig {
        workers: 0,
        queue_size: 1,
    })
    .await;

    let first = fixture.upload("chan-1", "a.mp4", b"bytes").await;
    assert_eq!(first.status, StatusCode::ACCEPTED);

    let second = fixture.upload("chan-1", "b.mp4", b"bytes").await;
    assert_eq!(second.status, StatusCode::SERVICE_UNAVAILABLE);

    // The rejected upload's record is failed, not stuck uploading.
    let listing = fixture.get("/api/v1/videos?status=failed").await;
    assert_eq!(listing.body["total"], 1);
}

#[tokio::test]
async fn test_get_missing_video_is_404() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/videos/no-such-id").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failed_video_reports_error_message() {
    let fixture = TestFixture::new().await;

    fixture
        .transcoder
        .set_next_error(clipstream_core::TranscodeError::encode_failed(
            "codec exploded",
            None,
        ))
        .await;

    let response = fixture.upload("chan-1", "clip.mp4", b"bytes").await;
    let video_id = response.body["id"].as_str().unwrap().to_string();

    let done = fixture.wait_for_terminal(&video_id).await;
    assert_eq!(done.body["status"], "failed");
    assert!(done.body["error_message"]
        .as_str()
        .unwrap()
        .contains("codec exploded"));
    assert!(done.body.get("playback").is_none());
}

#[tokio::test]
async fn test_list_videos_with_filters() {
    let fixture = TestFixture::new().await;

    let first = fixture.upload("chan-1", "a.mp4", b"bytes").await;
    let second = fixture.upload("chan-2", "b.mp4", b"bytes").await;
    fixture
        .wait_for_terminal(first.body["id"].as_str().unwrap())
        .await;
    fixture
        .wait_for_terminal(second.body["id"].as_str().unwrap())
        .await;

    let all = fixture.get("/api/v1/videos").await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body["total"], 2);

    let chan_1 = fixture.get("/api/v1/videos?channel_id=chan-1").await;
    assert_eq!(chan_1.body["total"], 1);
    assert_eq!(chan_1.body["videos"][0]["channel_id"], "chan-1");

    let ready = fixture.get("/api/v1/videos?status=ready").await;
    assert_eq!(ready.body["total"], 2);

    let uploading = fixture.get("/api/v1/videos?status=uploading").await;
    assert_eq!(uploading.body["total"], 0);
}

#[tokio::test]
async fn test_list_videos_pagination() {
    let fixture = TestFixture::new().await;

    for name in ["a.mp4", "b.mp4", "c.mp4"] {
        let response = fixture.upload("chan-1", name, b"bytes").await;
        fixture
            .wait_for_terminal(response.body["id"].as_str().unwrap())
            .await;
    }

    let page = fixture.get("/api/v1/videos?limit=2&offset=0").await;
    assert_eq!(page.body["videos"].as_array().unwrap().len(), 2);
    assert_eq!(page.body["limit"], 2);

    let rest = fixture.get("/api/v1/videos?limit=2&offset=2").await;
    assert_eq!(rest.body["videos"].as_array().unwrap().len(), 1);
}
