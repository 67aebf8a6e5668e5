pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod repository;
pub mod store;
pub mod testing;
pub mod transcoder;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use pipeline::{JobRequest, PipelineConfig, PipelineError, PipelineStatus, VideoPipeline};
pub use repository::{
    NewVideo, RepositoryError, SqliteVideoRepository, Video, VideoFilter, VideoRepository,
    VideoStatus,
};
pub use store::{ArtifactStore, S3Store, StorageConfig, StoreError};
pub use transcoder::{FfmpegTranscoder, TranscodeError, Transcoder, TranscoderConfig};
