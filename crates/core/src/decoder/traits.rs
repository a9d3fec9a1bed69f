//! Trait definitions for the decoder module.

use async_trait::async_trait;
use std::path::Path;

use super::error::DecoderError;
use super::types::{ExtractedFrames, ExtractionParams};

/// Something that can turn a video file into a bounded set of frames.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Returns the name of this extractor implementation.
    fn name(&self) -> &str;

    /// Samples at most `params.max_frames` frames from the video, each
    /// resized to `params.frame_size` square.
    async fn extract_frames(
        &self,
        path: &Path,
        params: &ExtractionParams,
    ) -> Result<ExtractedFrames, DecoderError>;

    /// Validates that the extractor is ready to use.
    async fn validate(&self) -> Result<(), DecoderError> {
        Ok(())
    }
}
