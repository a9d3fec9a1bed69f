//! Testing utilities and mock implementations.
//!
//! Mocks for the two delegate traits let the orchestrator and the HTTP API
//! be exercised end to end without ffmpeg or a model server.
//!
//! # Example
//!
//! ```rust,ignore
//! use vidcap_core::testing::{MockFrameExtractor, MockInferenceBackend};
//!
//! let backend = Arc::new(MockInferenceBackend::new());
//! let extractor = Arc::new(MockFrameExtractor::new());
//! extractor.fail_for("broken.mp4", "moov atom not found").await;
//!
//! let orchestrator = BatchOrchestrator::new(backend.clone(), extractor.clone());
//! ```

mod mock_frame_extractor;
mod mock_inference_backend;

pub use mock_frame_extractor::MockFrameExtractor;
pub use mock_inference_backend::{MockInferenceBackend, RecordedGeneration};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::settings::Settings;

    /// Settings with small, fast values.
    pub fn test_settings() -> Settings {
        Settings {
            max_frames: 4,
            frame_size: 224,
            max_tokens: 128,
            ..Settings::default()
        }
    }

    /// Create empty placeholder video files in `dir` and return their paths.
    pub fn video_files(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                std::fs::write(&path, b"not really a video").expect("write test video");
                path
            })
            .collect()
    }
}
