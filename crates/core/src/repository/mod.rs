//! Video repository: persistence of video records and their status
//! transitions.

mod sqlite;
mod store;
mod types;

pub use sqlite::SqliteVideoRepository;
pub use store::{RepositoryError, VideoFilter, VideoRepository};
pub use types::{NewVideo, Video, VideoStatus};
