use std::sync::Arc;

use clipstream_core::{
    ArtifactStore, Config, SanitizedConfig, VideoPipeline, VideoRepository,
};

/// Shared application state
pub struct AppState {
    config: Config,
    repository: Arc<dyn VideoRepository>,
    store: Arc<dyn ArtifactStore>,
    pipeline: Arc<VideoPipeline>,
}

impl AppState {
    pub fn new(
        config: Config,
        repository: Arc<dyn VideoRepository>,
        store: Arc<dyn ArtifactStore>,
        pipeline: Arc<VideoPipeline>,
    ) -> Self {
        Self {
            config,
            repository,
            store,
            pipeline,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn repository(&self) -> &dyn VideoRepository {
        self.repository.as_ref()
    }

    pub fn store(&self) -> &dyn ArtifactStore {
        self.store.as_ref()
    }

    pub fn pipeline(&self) -> &VideoPipeline {
        &self.pipeline
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.config.server.max_upload_bytes
    }

    pub fn signed_url_ttl_secs(&self) -> u64 {
        self.config.storage.signed_url_ttl_secs
    }
}
