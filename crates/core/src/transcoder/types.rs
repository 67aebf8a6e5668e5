//! Core transcoder data types and the fixed rendition table.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One fixed-resolution HLS rendition of the source video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rendition {
    /// Short name, also the rendition playlist file stem.
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    /// Target video bitrate in kbps.
    pub video_bitrate_kbps: u32,
    /// BANDWIDTH attribute advertised in the master manifest.
    pub bandwidth: u32,
    /// CODECS attribute advertised in the master manifest.
    pub codecs: &'static str,
}

impl Rendition {
    /// The rendition playlist filename, e.g. `high.m3u8`.
    pub fn playlist_name(&self) -> String {
        format!("{}.m3u8", self.label)
    }

    /// The resolution formatted as `WIDTHxHEIGHT`.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// The fixed rendition ladder, in descending quality order.
///
/// The cardinality and ordering here are load-bearing: the master
/// manifest lists exactly these three entries in this order.
pub const RENDITIONS: [Rendition; 3] = [
    Rendition {
        label: "high",
        width: 1280,
        height: 720,
        video_bitrate_kbps: 2800,
        bandwidth: 3_200_000,
        codecs: "avc1.42e01e,mp4a.40.2",
    },
    Rendition {
        label: "medium",
        width: 854,
        height: 480,
        video_bitrate_kbps: 1400,
        bandwidth: 1_600_000,
        codecs: "avc1.42e01e,mp4a.40.2",
    },
    Rendition {
        label: "low",
        width: 640,
        height: 360,
        video_bitrate_kbps: 800,
        bandwidth: 900_000,
        codecs: "avc1.42e01e,mp4a.40.2",
    },
];

/// Filename of the master playlist inside a rendition directory.
pub const MASTER_MANIFEST_NAME: &str = "master.m3u8";

/// Filename of the thumbnail inside a rendition directory.
pub const THUMBNAIL_NAME: &str = "thumbnail.jpg";

/// Renders the static master playlist text.
///
/// The manifest is templated from [`RENDITIONS`], not derived from
/// encoder output: it always advertises all three renditions even if
/// fewer playlist files exist on disk.
pub fn master_manifest() -> String {
    let mut out = String::from("#EXTM3U\n#EXT-X-VERSION:3\n");
    for rendition in &RENDITIONS {
        out.push_str(&format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={},CODECS=\"{}\"\n{}\n",
            rendition.bandwidth,
            rendition.resolution(),
            rendition.codecs,
            rendition.playlist_name(),
        ));
    }
    out
}

/// Result of a full transcode run for one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeOutput {
    /// Directory holding rendition playlists, segments and the master manifest.
    pub rendition_dir: PathBuf,

    /// Where the thumbnail was written, if any strategy produced one.
    pub thumbnail_path: Option<PathBuf>,

    /// Probed source duration in seconds; 0 when the probe could not
    /// determine a numeric duration.
    pub duration_secs: f64,
}
