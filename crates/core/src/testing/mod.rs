//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides mock implementations of the transcoder and
//! artifact store traits, allowing full pipeline testing without
//! ffmpeg or an object store.
//!
//! # Example
//!
//! ```rust,ignore
//! use clipstream_core::testing::{MockStore, MockTranscoder};
//!
//! let transcoder = MockTranscoder::with_output_root("/tmp/renditions");
//! let store = MockStore::new();
//!
//! // Configure mock behavior
//! transcoder.set_duration(15.0).await;
//! store.set_fail_matching("thumbnail").await;
//!
//! // Use in a VideoPipeline...
//! ```

mod mock_store;
mod mock_transcoder;

pub use mock_store::{MockStore, RecordedUpload};
pub use mock_transcoder::{MockTranscoder, RecordedProcess};
