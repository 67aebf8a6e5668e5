//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use super::config::TranscoderConfig;
use super::error::TranscodeError;
use super::thumbnail::ThumbnailChain;
use super::traits::Transcoder;
use super::types::{master_manifest, TranscodeOutput, MASTER_MANIFEST_NAME, RENDITIONS, THUMBNAIL_NAME};

/// FFmpeg-based transcoder implementation.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
    thumbnails: ThumbnailChain,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        let thumbnails = ThumbnailChain::new(config.clone());
        Self { config, thumbnails }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Builds the single ffmpeg invocation producing all renditions.
    ///
    /// One input, one output group per rendition: segmented HLS with
    /// 10 second fragments and an unbounded playlist so the whole
    /// asset stays listed.
    fn build_rendition_args(&self, input: &Path, out_dir: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(), // Overwrite output
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ];

        args.extend(self.config.extra_ffmpeg_args.iter().cloned());

        for rendition in &RENDITIONS {
            args.extend([
                "-s".to_string(),
                rendition.resolution(),
                "-c:v".to_string(),
                "libx264".to_string(),
                "-profile:v".to_string(),
                "baseline".to_string(),
                "-level".to_string(),
                "3.0".to_string(),
                "-c:a".to_string(),
                "aac".to_string(),
                "-b:a".to_string(),
                "128k".to_string(),
                "-b:v".to_string(),
                format!("{}k", rendition.video_bitrate_kbps),
                "-start_number".to_string(),
                "0".to_string(),
                "-hls_time".to_string(),
                "10".to_string(),
                "-hls_list_size".to_string(),
                "0".to_string(),
                "-f".to_string(),
                "hls".to_string(),
                out_dir
                    .join(rendition.playlist_name())
                    .to_string_lossy()
                    .to_string(),
            ]);
        }

        args
    }

    /// Parses the source duration out of ffprobe JSON output.
    ///
    /// A missing or non-numeric duration yields 0.0 rather than an
    /// error; only malformed JSON is reported.
    fn parse_probe_duration(output: &str) -> Result<f64, TranscodeError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| TranscodeError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        Ok(probe
            .format
            .duration
            .as_ref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0))
    }

    /// Runs the encode, producing all rendition playlists and segments.
    async fn produce_renditions(&self, input: &Path, out_dir: &Path) -> Result<(), TranscodeError> {
        let args = self.build_rendition_args(input, out_dir);

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        let stderr = match child.stderr.take() {
            Some(stderr) => stderr,
            None => {
                return Err(TranscodeError::encode_failed(
                    "Failed to capture ffmpeg stderr",
                    None,
                ))
            }
        };
        let mut reader = BufReader::new(stderr).lines();

        let timeout_duration = Duration::from_secs(self.config.encode_timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut error_output = String::new();

            while let Ok(Some(line)) = reader.next_line().await {
                if line.contains("Error") || line.contains("error") {
                    error_output.push_str(&line);
                    error_output.push('\n');
                }
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, error_output))
        })
        .await;

        match result {
            Ok(Ok((status, error_output))) => {
                if !status.success() {
                    return Err(TranscodeError::encode_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        if error_output.is_empty() {
                            None
                        } else {
                            Some(error_output)
                        },
                    ));
                }
                Ok(())
            }
            Ok(Err(e)) => Err(TranscodeError::Io(e)),
            Err(_) => {
                // Kill the process on timeout so a hung encoder cannot
                // occupy a worker slot indefinitely.
                let _ = child.kill().await;
                Err(TranscodeError::Timeout {
                    timeout_secs: self.config.encode_timeout_secs,
                })
            }
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64, TranscodeError> {
        if !path.exists() {
            return Err(TranscodeError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(TranscodeError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_duration(&stdout)
    }

    async fn process(
        &self,
        input: &Path,
        channel_id: &str,
        video_id: &str,
    ) -> Result<TranscodeOutput, TranscodeError> {
        if !input.exists() {
            return Err(TranscodeError::InputNotFound {
                path: input.to_path_buf(),
            });
        }

        let out_dir = self.config.output_root.join(channel_id).join(video_id);
        tokio::fs::create_dir_all(&out_dir)
            .await
            .map_err(|_| TranscodeError::OutputDirectoryFailed {
                path: out_dir.clone(),
            })?;

        let duration_secs = self.probe_duration(input).await?;

        self.produce_renditions(input, &out_dir).await?;

        tokio::fs::write(out_dir.join(MASTER_MANIFEST_NAME), master_manifest()).await?;

        // Thumbnail extraction never fails the job: the chain falls
        // through to a synthesized placeholder, and even a chain error
        // only leaves the thumbnail absent.
        let thumbnail_target = out_dir.join(THUMBNAIL_NAME);
        let thumbnail_path = match self
            .thumbnails
            .generate(input, duration_secs, &thumbnail_target)
            .await
        {
            Ok(strategy) => {
                tracing::debug!(video_id, strategy = %strategy, "thumbnail produced");
                Some(thumbnail_target)
            }
            Err(e) => {
                tracing::warn!(video_id, error = %e, "thumbnail chain failed, continuing without");
                None
            }
        };

        Ok(TranscodeOutput {
            rendition_dir: out_dir,
            thumbnail_path,
            duration_secs,
        })
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        // Check ffmpeg exists
        let ffmpeg_result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffmpeg_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(TranscodeError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(TranscodeError::Io(e));
        }

        // Check ffprobe exists
        let ffprobe_result = Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffprobe_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(TranscodeError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(TranscodeError::Io(e));
        }

        // Ensure the output root exists
        tokio::fs::create_dir_all(&self.config.output_root).await?;

        Ok(())
    }
}
