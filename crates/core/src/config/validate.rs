use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Storage bucket is non-empty
/// - Pipeline worker count and queue capacity are at least 1
/// - Pipeline and transcoder agree on the rendition output root
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Storage validation
    if config.storage.bucket.is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.bucket cannot be empty".to_string(),
        ));
    }

    // Pipeline validation
    if config.pipeline.workers == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.workers must be at least 1".to_string(),
        ));
    }
    if config.pipeline.queue_size == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.queue_size must be at least 1".to_string(),
        ));
    }

    // Cleanup removes the rendition directory it computes from the
    // pipeline's output root, so a mismatch would leak encoder output.
    if config.pipeline.output_root != config.transcoder.output_root {
        return Err(ConfigError::ValidationError(format!(
            "pipeline.output_root ({}) must match transcoder.output_root ({})",
            config.pipeline.output_root.display(),
            config.transcoder.output_root.display(),
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_empty_bucket_fails() {
        let mut config = Config::default();
        config.storage.bucket = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_workers_fails() {
        let mut config = Config::default();
        config.pipeline.workers = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_output_root_mismatch_fails() {
        let mut config = Config::default();
        config.pipeline.output_root = PathBuf::from("somewhere-else");
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("output_root"));
    }
}
