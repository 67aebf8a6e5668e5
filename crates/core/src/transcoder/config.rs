//! Configuration for the transcoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based transcoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Root directory for rendition output, one subdirectory per job.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Timeout for a single encode run in seconds.
    #[serde(default = "default_encode_timeout")]
    pub encode_timeout_secs: u64,

    /// Timeout for a single thumbnail frame extraction in seconds.
    #[serde(default = "default_thumbnail_timeout")]
    pub thumbnail_timeout_secs: u64,

    /// How long to wait for an extracted frame to land on disk, in milliseconds.
    #[serde(default = "default_thumbnail_wait_ms")]
    pub thumbnail_wait_ms: u64,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,

    /// Additional global ffmpeg arguments.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_output_root() -> PathBuf {
    PathBuf::from("processed")
}

fn default_encode_timeout() -> u64 {
    3600 // 1 hour
}

fn default_thumbnail_timeout() -> u64 {
    60
}

fn default_thumbnail_wait_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "warning".to_string()
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            output_root: default_output_root(),
            encode_timeout_secs: default_encode_timeout(),
            thumbnail_timeout_secs: default_thumbnail_timeout(),
            thumbnail_wait_ms: default_thumbnail_wait_ms(),
            ffmpeg_log_level: default_log_level(),
            extra_ffmpeg_args: Vec::new(),
        }
    }
}

impl TranscoderConfig {
    /// Creates a new config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }

    /// Sets the rendition output root.
    pub fn with_output_root(mut self, output_root: PathBuf) -> Self {
        self.output_root = output_root;
        self
    }

    /// Sets the encode timeout in seconds.
    pub fn with_encode_timeout(mut self, timeout_secs: u64) -> Self {
        self.encode_timeout_secs = timeout_secs;
        self
    }
}
