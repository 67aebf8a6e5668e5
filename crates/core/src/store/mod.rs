//! Artifact store module: durable object storage for published assets.
//!
//! Every published artifact lives under a `processed/{channel}/{video}/`
//! key prefix mirroring the local rendition directory layout. Reads go
//! through time-limited signed URLs.

mod config;
mod error;
mod s3;
mod traits;

pub use config::StorageConfig;
pub use error::StoreError;
pub use s3::S3Store;
pub use traits::{content_type_for_key, ArtifactStore, DEFAULT_SIGNED_URL_TTL_SECS};
