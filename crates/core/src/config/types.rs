use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::pipeline::PipelineConfig;
use crate::store::StorageConfig;
use crate::transcoder::TranscoderConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            storage: StorageConfig::default(),
            transcoder: TranscoderConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    2 * 1024 * 1024 * 1024
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("clipstream.db")
}

/// Sanitized config for API responses (endpoint details redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: SanitizedStorageConfig,
    pub transcoder: SanitizedTranscoderConfig,
    pub pipeline: PipelineConfig,
}

/// Sanitized storage config (custom endpoint hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint_configured: bool,
    pub signed_url_ttl_secs: u64,
}

/// Sanitized transcoder config (timeouts and paths, no extra args)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTranscoderConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub output_root: PathBuf,
    pub encode_timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            storage: SanitizedStorageConfig {
                bucket: config.storage.bucket.clone(),
                region: config.storage.region.clone(),
                endpoint_configured: config.storage.endpoint.is_some(),
                signed_url_ttl_secs: config.storage.signed_url_ttl_secs,
            },
            transcoder: SanitizedTranscoderConfig {
                ffmpeg_path: config.transcoder.ffmpeg_path.clone(),
                ffprobe_path: config.transcoder.ffprobe_path.clone(),
                output_root: config.transcoder.output_root.clone(),
                encode_timeout_secs: config.transcoder.encode_timeout_secs,
            },
            pipeline: config.pipeline.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "clipstream.db");
        assert_eq!(config.storage.bucket, "clipstream-media");
        assert_eq!(config.pipeline.workers, 2);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[storage]
bucket = "media-test"
region = "eu-west-1"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.storage.bucket, "media-test");
        assert_eq!(config.storage.region, "eu-west-1");
        // Untouched sections keep their defaults.
        assert_eq!(config.transcoder.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.pipeline.queue_size, 16);
    }

    #[test]
    fn test_deserialize_with_custom_database_path() {
        let toml = r#"
[database]
path = "/data/my-db.sqlite"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.database.path.to_str().unwrap(), "/data/my-db.sqlite");
    }

    #[test]
    fn test_sanitized_config_hides_endpoint() {
        let mut config = Config::default();
        config.storage.endpoint = Some("http://localhost:9000".to_string());

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.storage.endpoint_configured);
        assert_eq!(sanitized.storage.bucket, "clipstream-media");
        // The raw endpoint URL never appears in the sanitized view.
        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("localhost:9000"));
    }

    #[test]
    fn test_sanitized_config_without_endpoint() {
        let config = Config::default();
        let sanitized = SanitizedConfig::from(&config);
        assert!(!sanitized.storage.endpoint_configured);
        assert_eq!(sanitized.server.port, 8080);
        assert_eq!(sanitized.transcoder.encode_timeout_secs, 3600);
    }
}
