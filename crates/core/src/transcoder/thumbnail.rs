//! Thumbnail generation with a layered fallback chain.
//!
//! Three strategies are tried in order: a frame at the source
//! midpoint, the first decodable frame, and finally a synthesized
//! placeholder. The chain's postcondition is that a JPEG exists at
//! the target path whenever it returns `Ok`.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{sleep, timeout, Duration};

use super::config::TranscoderConfig;
use super::error::TranscodeError;

/// Thumbnail raster width in pixels.
pub const THUMBNAIL_WIDTH: u32 = 640;

/// Thumbnail raster height in pixels.
pub const THUMBNAIL_HEIGHT: u32 = 360;

const PLACEHOLDER_TEXT: &str = "THUMBNAIL NOT AVAILABLE";

/// One attempt in the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailStrategy {
    /// Frame at 50% of the probed duration.
    MidpointFrame,
    /// First decodable frame.
    FirstFrame,
    /// Synthesized placeholder image; the chain's floor guarantee.
    Placeholder,
}

impl fmt::Display for ThumbnailStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThumbnailStrategy::MidpointFrame => write!(f, "midpoint_frame"),
            ThumbnailStrategy::FirstFrame => write!(f, "first_frame"),
            ThumbnailStrategy::Placeholder => write!(f, "placeholder"),
        }
    }
}

/// Ordered list of fallible strategies, each absorbing its own failure.
pub struct ThumbnailChain {
    config: TranscoderConfig,
}

impl ThumbnailChain {
    /// Creates a chain using the given transcoder configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// The strategies in attempt order.
    pub fn strategies() -> [ThumbnailStrategy; 3] {
        [
            ThumbnailStrategy::MidpointFrame,
            ThumbnailStrategy::FirstFrame,
            ThumbnailStrategy::Placeholder,
        ]
    }

    /// Runs the chain until one strategy lands a file at `target`.
    ///
    /// Returns the strategy that produced the file. Individual
    /// strategy failures are logged and swallowed; the error case is
    /// only reachable when even the placeholder write fails.
    pub async fn generate(
        &self,
        input: &Path,
        duration_secs: f64,
        target: &Path,
    ) -> Result<ThumbnailStrategy, TranscodeError> {
        let mut last_error = None;

        for strategy in Self::strategies() {
            match self.attempt(strategy, input, duration_secs, target).await {
                Ok(()) => {
                    crate::metrics::THUMBNAIL_STRATEGY_USED
                        .with_label_values(&[&strategy.to_string()])
                        .inc();
                    return Ok(strategy);
                }
                Err(e) => {
                    tracing::debug!(strategy = %strategy, error = %e, "thumbnail strategy failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            TranscodeError::encode_failed("no thumbnail strategy available", None)
        }))
    }

    async fn attempt(
        &self,
        strategy: ThumbnailStrategy,
        input: &Path,
        duration_secs: f64,
        target: &Path,
    ) -> Result<(), TranscodeError> {
        match strategy {
            ThumbnailStrategy::MidpointFrame => {
                if duration_secs <= 0.0 {
                    return Err(TranscodeError::probe_failed(
                        "source duration unknown, cannot seek to midpoint",
                    ));
                }
                let seek = format!("{:.3}", duration_secs / 2.0);
                self.extract_frame(input, &seek, target).await
            }
            ThumbnailStrategy::FirstFrame => {
                self.extract_frame(input, "00:00:00.001", target).await
            }
            ThumbnailStrategy::Placeholder => self.write_placeholder(target).await,
        }
    }

    /// Extracts a single frame at `seek` into a 640x360 JPEG.
    ///
    /// After the encoder exits, waits briefly for the write to land
    /// and treats a missing file as attempt failure.
    async fn extract_frame(
        &self,
        input: &Path,
        seek: &str,
        target: &Path,
    ) -> Result<(), TranscodeError> {
        let args = vec![
            "-y".to_string(),
            "-ss".to_string(),
            seek.to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-vframes".to_string(),
            "1".to_string(),
            "-s".to_string(),
            format!("{}x{}", THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT),
            "-q:v".to_string(),
            "2".to_string(),
            "-f".to_string(),
            "image2".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            target.to_string_lossy().to_string(),
        ];

        let mut command = Command::new(&self.config.ffmpeg_path);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let timeout_duration = Duration::from_secs(self.config.thumbnail_timeout_secs);
        let result = timeout(timeout_duration, command.output()).await;

        match result {
            Ok(Ok(out)) => {
                if !out.status.success() {
                    return Err(TranscodeError::encode_failed(
                        format!("frame extraction exited with code: {:?}", out.status.code()),
                        Some(String::from_utf8_lossy(&out.stderr).to_string()),
                    ));
                }
            }
            Ok(Err(e)) => {
                if e.kind() == std::io::ErrorKind::NotFound {
                    return Err(TranscodeError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    });
                }
                return Err(TranscodeError::Io(e));
            }
            Err(_) => {
                return Err(TranscodeError::Timeout {
                    timeout_secs: self.config.thumbnail_timeout_secs,
                })
            }
        }

        sleep(Duration::from_millis(self.config.thumbnail_wait_ms)).await;

        match tokio::fs::metadata(target).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(TranscodeError::encode_failed(
                "extracted frame did not appear on disk",
                None,
            )),
        }
    }

    /// Writes the synthesized 640x360 placeholder JPEG.
    async fn write_placeholder(&self, target: &Path) -> Result<(), TranscodeError> {
        let bytes = render_placeholder_jpeg()?;
        tokio::fs::write(target, bytes).await?;
        Ok(())
    }
}

/// Renders the fixed placeholder: dark background, centered text.
fn render_placeholder_jpeg() -> Result<Vec<u8>, TranscodeError> {
    let mut img = image::RgbImage::from_pixel(
        THUMBNAIL_WIDTH,
        THUMBNAIL_HEIGHT,
        image::Rgb([16, 16, 16]),
    );

    // 5x7 bitmap glyphs scaled up; no font assets needed, so this
    // path has no failure mode beyond the final encode.
    let scale = 4u32;
    let cell_width = 6 * scale; // 5px glyph + 1px spacing
    let text_width = PLACEHOLDER_TEXT.len() as u32 * cell_width - scale;
    let text_height = 7 * scale;
    let x0 = (THUMBNAIL_WIDTH - text_width) / 2;
    let y0 = (THUMBNAIL_HEIGHT - text_height) / 2;

    for (i, ch) in PLACEHOLDER_TEXT.chars().enumerate() {
        let glyph = glyph_rows(ch);
        let gx = x0 + i as u32 * cell_width;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..5u32 {
                if bits & (0x10 >> col) != 0 {
                    for dy in 0..scale {
                        for dx in 0..scale {
                            let x = gx + col * scale + dx;
                            let y = y0 + row as u32 * scale + dy;
                            img.put_pixel(x, y, image::Rgb([235, 235, 235]));
                        }
                    }
                }
            }
        }
    }

    let mut buffer = Cursor::new(Vec::new());
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, 85)
        .encode(
            img.as_raw(),
            THUMBNAIL_WIDTH,
            THUMBNAIL_HEIGHT,
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| {
            TranscodeError::encode_failed(format!("placeholder encode failed: {}", e), None)
        })?;

    Ok(buffer.into_inner())
}

/// Row patterns for the handful of glyphs the placeholder needs.
/// Bit 4 is the leftmost column.
fn glyph_rows(ch: char) -> [u8; 7] {
    match ch {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        _ => [0x00; 7],
    }
}
