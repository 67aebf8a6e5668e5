//! Configuration for the pipeline module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the transcode pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root directory for staging workspaces, one per job.
    #[serde(default = "default_staging_root")]
    pub staging_root: PathBuf,

    /// Root directory for rendition output; must match the transcoder's.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Number of worker tasks draining the job queue.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the job queue; submissions beyond it are rejected.
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
}

fn default_staging_root() -> PathBuf {
    PathBuf::from("temp")
}

fn default_output_root() -> PathBuf {
    PathBuf::from("processed")
}

fn default_workers() -> usize {
    2
}

fn default_queue_size() -> usize {
    16
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            staging_root: default_staging_root(),
            output_root: default_output_root(),
            workers: default_workers(),
            queue_size: default_queue_size(),
        }
    }
}

impl PipelineConfig {
    /// Sets the staging root.
    pub fn with_staging_root(mut self, staging_root: PathBuf) -> Self {
        self.staging_root = staging_root;
        self
    }

    /// Sets the rendition output root.
    pub fn with_output_root(mut self, output_root: PathBuf) -> Self {
        self.output_root = output_root;
        self
    }

    /// Sets the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the queue capacity.
    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.staging_root, PathBuf::from("temp"));
        assert_eq!(config.output_root, PathBuf::from("processed"));
        assert_eq!(config.workers, 2);
        assert_eq!(config.queue_size, 16);
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::default()
            .with_staging_root(PathBuf::from("/var/tmp/staging"))
            .with_workers(4)
            .with_queue_size(64);
        assert_eq!(config.staging_root, PathBuf::from("/var/tmp/staging"));
        assert_eq!(config.workers, 4);
        assert_eq!(config.queue_size, 64);
    }
}
