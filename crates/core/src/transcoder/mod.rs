//! Transcoder module: turns a staged upload into an HLS asset.
//!
//! Wraps FFmpeg to probe the source duration, produce the fixed
//! three-rendition HLS ladder in a single invocation, write the static
//! master manifest, and run the thumbnail fallback chain.
//!
//! # Example
//!
//! ```ignore
//! use clipstream_core::transcoder::{FfmpegTranscoder, Transcoder};
//!
//! let transcoder = FfmpegTranscoder::with_defaults();
//! transcoder.validate().await?;
//!
//! let output = transcoder
//!     .process(Path::new("temp/ch-1/vid-1/raw.mp4"), "ch-1", "vid-1")
//!     .await?;
//! println!("renditions in {:?}", output.rendition_dir);
//! ```

mod config;
mod error;
mod ffmpeg;
mod thumbnail;
mod traits;
mod types;

pub use config::TranscoderConfig;
pub use error::TranscodeError;
pub use ffmpeg::FfmpegTranscoder;
pub use thumbnail::{ThumbnailChain, ThumbnailStrategy, THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH};
pub use traits::Transcoder;
pub use types::{
    master_manifest, Rendition, TranscodeOutput, MASTER_MANIFEST_NAME, RENDITIONS, THUMBNAIL_NAME,
};
