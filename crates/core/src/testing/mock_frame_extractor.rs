//! Mock frame extractor for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::decoder::{
    DecoderError, ExtractedFrames, ExtractionParams, Frame, FrameExtractor, VideoMetadata,
};

/// Mock implementation of the FrameExtractor trait.
///
/// Returns solid-colour frames sized to the request without touching the
/// file system. Failures are configured per file name.
#[derive(Debug)]
pub struct MockFrameExtractor {
    /// Frames produced per video, capped by `max_frames`.
    frame_count: Arc<RwLock<usize>>,
    duration_secs: Arc<RwLock<f64>>,
    /// Failures keyed by file name.
    failures: Arc<RwLock<HashMap<String, String>>>,
    /// File names whose extraction panics.
    panics: Arc<RwLock<HashSet<String>>>,
    extractions: Arc<RwLock<Vec<(PathBuf, ExtractionParams)>>>,
}

impl Default for MockFrameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFrameExtractor {
    /// Create a new mock extractor.
    pub fn new() -> Self {
        Self {
            frame_count: Arc::new(RwLock::new(8)),
            duration_secs: Arc::new(RwLock::new(12.0)),
            failures: Arc::new(RwLock::new(HashMap::new())),
            panics: Arc::new(RwLock::new(HashSet::new())),
            extractions: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn set_frame_count(&self, count: usize) {
        *self.frame_count.write().await = count;
    }

    /// Fail extraction for the video whose file name is `file_name`.
    pub async fn fail_for(&self, file_name: impl Into<String>, message: impl Into<String>) {
        self.failures
            .write()
            .await
            .insert(file_name.into(), message.into());
    }

    /// Panic while extracting the video whose file name is `file_name`.
    pub async fn panic_for(&self, file_name: impl Into<String>) {
        self.panics.write().await.insert(file_name.into());
    }

    /// Paths and parameters of every extraction, in order.
    pub async fn recorded_extractions(&self) -> Vec<(PathBuf, ExtractionParams)> {
        self.extractions.read().await.clone()
    }

    pub async fn extraction_count(&self) -> usize {
        self.extractions.read().await.len()
    }
}

#[async_trait]
impl FrameExtractor for MockFrameExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn extract_frames(
        &self,
        path: &Path,
        params: &ExtractionParams,
    ) -> Result<ExtractedFrames, DecoderError> {
        self.extractions
            .write()
            .await
            .push((path.to_path_buf(), *params));

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.panics.read().await.contains(&file_name) {
            panic!("mock extractor panicked on {}", file_name);
        }
        if let Some(message) = self.failures.read().await.get(&file_name) {
            return Err(DecoderError::extraction_failed(message.clone(), None));
        }

        let count = (*self.frame_count.read().await).min(params.max_frames as usize);
        let size = params.frame_size;
        let frames: Vec<Frame> = (0..count)
            .map(|i| Frame::solid(size, size, [(i * 16 % 256) as u8, 64, 128]))
            .collect();

        Ok(ExtractedFrames {
            metadata: VideoMetadata {
                duration_secs: *self.duration_secs.read().await,
                width: Some(size),
                height: Some(size),
                fps: Some(30.0),
                frames_extracted: frames.len(),
            },
            frames,
        })
    }
}
