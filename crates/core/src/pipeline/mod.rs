//! Upload-triggered transcode pipeline.
//!
//! Coordinates the full lifecycle of a job: staging the raw upload,
//! running the transcoder, publishing artifacts to the object store,
//! finalizing the video record, and cleaning up local disk.

mod config;
#[allow(clippy::module_inception)]
mod pipeline;
mod types;

pub use config::PipelineConfig;
pub use pipeline::{cleanup_job_dirs, PipelineError, VideoPipeline};
pub use types::{JobRequest, PipelineStatus, PoolStatus};
