//! Mock transcoder for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::transcoder::{
    master_manifest, TranscodeError, TranscodeOutput, Transcoder, MASTER_MANIFEST_NAME,
    RENDITIONS, THUMBNAIL_NAME,
};

/// A recorded transcode run for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedProcess {
    /// The staged input path.
    pub input: PathBuf,
    pub channel_id: String,
    pub video_id: String,
    /// Whether the run succeeded.
    pub success: bool,
}

/// Mock implementation of the Transcoder trait.
///
/// Writes a realistic rendition directory layout (master manifest,
/// per-rendition playlists and segments, optional thumbnail) without
/// invoking any external binary, and provides:
/// - Recorded runs for assertions
/// - Error injection
/// - A controllable probe duration
pub struct MockTranscoder {
    output_root: Arc<RwLock<PathBuf>>,
    runs: Arc<RwLock<Vec<RecordedProcess>>>,
    next_error: Arc<RwLock<Option<TranscodeError>>>,
    duration_secs: Arc<RwLock<f64>>,
    write_thumbnail: Arc<RwLock<bool>>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    /// Create a new mock transcoder writing under "processed".
    pub fn new() -> Self {
        Self {
            output_root: Arc::new(RwLock::new(PathBuf::from("processed"))),
            runs: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            duration_secs: Arc::new(RwLock::new(15.0)),
            write_thumbnail: Arc::new(RwLock::new(true)),
        }
    }

    /// Create a mock transcoder writing under the given root.
    pub fn with_output_root(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: Arc::new(RwLock::new(output_root.into())),
            ..Self::new()
        }
    }

    /// Set the output root.
    pub async fn set_output_root(&self, output_root: impl Into<PathBuf>) {
        *self.output_root.write().await = output_root.into();
    }

    /// Set the duration reported by probing and process results.
    pub async fn set_duration(&self, duration_secs: f64) {
        *self.duration_secs.write().await = duration_secs;
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: TranscodeError) {
        *self.next_error.write().await = Some(error);
    }

    /// Enable or disable thumbnail output.
    pub async fn set_write_thumbnail(&self, write: bool) {
        *self.write_thumbnail.write().await = write;
    }

    /// Get all recorded runs.
    pub async fn recorded_runs(&self) -> Vec<RecordedProcess> {
        self.runs.read().await.clone()
    }

    /// Get the number of runs performed.
    pub async fn run_count(&self) -> usize {
        self.runs.read().await.len()
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<TranscodeError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe_duration(&self, _path: &Path) -> Result<f64, TranscodeError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(*self.duration_secs.read().await)
    }

    async fn process(
        &self,
        input: &Path,
        channel_id: &str,
        video_id: &str,
    ) -> Result<TranscodeOutput, TranscodeError> {
        if let Some(err) = self.take_error().await {
            self.runs.write().await.push(RecordedProcess {
                input: input.to_path_buf(),
                channel_id: channel_id.to_string(),
                video_id: video_id.to_string(),
                success: false,
            });
            return Err(err);
        }

        let rendition_dir = self
            .output_root
            .read()
            .await
            .join(channel_id)
            .join(video_id);
        tokio::fs::create_dir_all(&rendition_dir).await?;

        tokio::fs::write(rendition_dir.join(MASTER_MANIFEST_NAME), master_manifest()).await?;
        for rendition in &RENDITIONS {
            tokio::fs::write(
                rendition_dir.join(rendition.playlist_name()),
                format!("#EXTM3U\n#EXT-X-TARGETDURATION:10\n{}_000.ts\n", rendition.label),
            )
            .await?;
            tokio::fs::write(
                rendition_dir.join(format!("{}_000.ts", rendition.label)),
                vec![0u8; 188],
            )
            .await?;
        }

        let thumbnail_path = if *self.write_thumbnail.read().await {
            let path = rendition_dir.join(THUMBNAIL_NAME);
            tokio::fs::write(&path, vec![0xFFu8, 0xD8, 0xFF, 0xD9]).await?;
            Some(path)
        } else {
            None
        };

        self.runs.write().await.push(RecordedProcess {
            input: input.to_path_buf(),
            channel_id: channel_id.to_string(),
            video_id: video_id.to_string(),
            success: true,
        });

        Ok(TranscodeOutput {
            rendition_dir,
            thumbnail_path,
            duration_secs: *self.duration_secs.read().await,
        })
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(())
    }
}
