//! Trait definitions for the transcoder module.

use async_trait::async_trait;
use std::path::Path;

use super::error::TranscodeError;
use super::types::TranscodeOutput;

/// A transcoder that turns a staged source file into an HLS asset.
///
/// The orchestrator only talks to this trait so it can be tested
/// against a fake without a real encoder installed.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Probes the source duration in seconds.
    ///
    /// Returns 0.0 when the probe output carries no numeric duration;
    /// only spawn or I/O level failures produce an error.
    async fn probe_duration(&self, path: &Path) -> Result<f64, TranscodeError>;

    /// Runs the full transcode for one video: all renditions, the
    /// master manifest, and the thumbnail chain.
    ///
    /// The rendition directory is namespaced by (channel_id, video_id)
    /// and owned exclusively by the calling job.
    async fn process(
        &self,
        input: &Path,
        channel_id: &str,
        video_id: &str,
    ) -> Result<TranscodeOutput, TranscodeError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), TranscodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct StaticTranscoder;

    #[async_trait]
    impl Transcoder for StaticTranscoder {
        fn name(&self) -> &str {
            "static"
        }

        async fn probe_duration(&self, _path: &Path) -> Result<f64, TranscodeError> {
            Ok(15.0)
        }

        async fn process(
            &self,
            _input: &Path,
            channel_id: &str,
            video_id: &str,
        ) -> Result<TranscodeOutput, TranscodeError> {
            let dir = PathBuf::from("processed").join(channel_id).join(video_id);
            Ok(TranscodeOutput {
                thumbnail_path: Some(dir.join("thumbnail.jpg")),
                rendition_dir: dir,
                duration_secs: 15.0,
            })
        }

        async fn validate(&self) -> Result<(), TranscodeError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_static_transcoder_probe() {
        let transcoder = StaticTranscoder;
        let duration = transcoder
            .probe_duration(Path::new("/test/file.mp4"))
            .await
            .unwrap();
        assert_eq!(duration, 15.0);
    }

    #[tokio::test]
    async fn test_static_transcoder_process_namespaces_output() {
        let transcoder = StaticTranscoder;
        let output = transcoder
            .process(Path::new("/test/file.mp4"), "chan-1", "vid-1")
            .await
            .unwrap();
        assert_eq!(output.rendition_dir, PathBuf::from("processed/chan-1/vid-1"));
        assert!(output.thumbnail_path.unwrap().ends_with("thumbnail.jpg"));
    }
}
