//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process
//! server with mock transcoder and artifact store injected, enabling
//! full upload-to-ready testing without ffmpeg or an object store.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use clipstream_core::{
    testing::{MockStore, MockTranscoder},
    ArtifactStore, Config, PipelineConfig, SqliteVideoRepository, Transcoder, VideoPipeline,
    VideoRepository,
};

/// Multipart boundary used by the fixture's upload helper.
const BOUNDARY: &str = "clipstream-test-boundary";

/// Test fixture for E2E testing with mock dependencies.
///
/// Provides an in-process server with fully controllable mocks for:
/// - Transcoding (MockTranscoder)
/// - Artifact storage (MockStore)
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock transcoder - control durations and inject errors
    pub transcoder: Arc<MockTranscoder>,
    /// Mock store - inspect uploads and inject failures
    pub store: Arc<MockStore>,
    /// The video repository backing the server
    pub repository: Arc<SqliteVideoRepository>,
    /// The pipeline driving jobs
    pub pipeline: Arc<VideoPipeline>,
    /// Temporary directory for database, staging and renditions
    pub temp_dir: TempDir,
}

/// Fixture configuration knobs.
pub struct TestConfig {
    pub workers: usize,
    pub queue_size: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_size: 16,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let staging_root = temp_dir.path().join("staging");
        let output_root = temp_dir.path().join("processed");

        let mut config = Config::default();
        config.database.path = db_path.clone();
        config.transcoder.output_root = output_root.clone();
        config.pipeline = PipelineConfig::default()
            .with_staging_root(staging_root)
            .with_output_root(output_root.clone())
            .with_workers(test_config.workers)
            .with_queue_size(test_config.queue_size);

        let transcoder = Arc::new(MockTranscoder::with_output_root(output_root));
        let store = Arc::new(MockStore::new());
        let repository = Arc::new(
            SqliteVideoRepository::new(&db_path).expect("Failed to create video repository"),
        );

        let pipeline = Arc::new(VideoPipeline::new(
            config.pipeline.clone(),
            Arc::clone(&transcoder) as Arc<dyn Transcoder>,
            Arc::clone(&store) as Arc<dyn ArtifactStore>,
            Arc::clone(&repository) as Arc<dyn VideoRepository>,
        ));
        pipeline.start().await;

        let state = Arc::new(clipstream_server::state::AppState::new(
            config,
            Arc::clone(&repository) as Arc<dyn VideoRepository>,
            Arc::clone(&store) as Arc<dyn ArtifactStore>,
            Arc::clone(&pipeline),
        ));

        let router = clipstream_server::api::create_router(state);

        Self {
            router,
            transcoder,
            store,
            repository,
            pipeline,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&body_bytes).to_string())
    }

    /// Upload a video through the multipart endpoint.
    pub async fn upload(&self, channel_id: &str, filename: &str, bytes: &[u8]) -> TestResponse {
        self.upload_with_fields(&[("channel_id", channel_id)], Some((filename, bytes)))
            .await
    }

    /// Upload with arbitrary text fields and an optional file part.
    pub async fn upload_with_fields(
        &self,
        fields: &[(&str, &str)],
        file: Option<(&str, &[u8])>,
    ) -> TestResponse {
        let mut body = Vec::new();

        for (name, value) in fields {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            );
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(b"\r\n");
        }

        if let Some((filename, bytes)) = file {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                    filename
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: video/mp4\r\n\r\n");
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/videos")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();

        self.send(request).await
    }

    /// Poll the detail endpoint until the video leaves the uploading state.
    pub async fn wait_for_terminal(&self, video_id: &str) -> TestResponse {
        for _ in 0..200 {
            let response = self.get(&format!("/api/v1/videos/{}", video_id)).await;
            if response.status == StatusCode::OK
                && response.body["status"].as_str() != Some("uploading")
            {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("video {} never reached a terminal state", video_id);
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
