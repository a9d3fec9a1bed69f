//! Types for the batch orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::settings::{Dtype, Settings};

/// Errors surfaced by the orchestrator's public operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The model could not be loaded. Carries the backend's message verbatim.
    #[error("{0}")]
    LoadFailed(String),

    /// A load or batch is currently in flight.
    #[error("orchestrator is busy with a load or batch")]
    Busy,
}

/// Top-level orchestration stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    #[default]
    Idle,
    LoadingModel,
    Processing,
    Complete,
    Error,
}

/// Step within a single video; only meaningful while processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingSubstage {
    #[default]
    Idle,
    ExtractingFrames,
    Encoding,
    Generating,
}

/// Immutable view of orchestration state at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub stage: ProcessingStage,
    pub substage: ProcessingSubstage,
    /// Fraction of the current video done, in `[0, 1]`.
    pub substage_progress: f32,
    pub current_video: Option<String>,
    pub video_index: usize,
    pub total_videos: usize,
    /// Output tokens generated since the orchestrator was created or reset.
    pub tokens_generated: u64,
    /// Rate reported by the most recent generation.
    pub tokens_per_sec: f64,
    pub model_loaded: bool,
    pub vram_used_bytes: u64,
    pub error_message: Option<String>,
    pub elapsed_seconds: f64,
}

/// Outcome of one video in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub video_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl ProcessingResult {
    pub fn succeeded(video_name: impl Into<String>, caption_preview: String, output_path: PathBuf) -> Self {
        Self {
            video_name: video_name.into(),
            success: true,
            error: None,
            caption_preview: Some(caption_preview),
            output_path: Some(output_path),
        }
    }

    pub fn failed(video_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            video_name: video_name.into(),
            success: false,
            error: Some(error.into()),
            caption_preview: None,
            output_path: None,
        }
    }
}

/// Read-only model status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub loaded: bool,
    pub model_id: Option<String>,
    pub device: Option<String>,
    pub dtype: Option<Dtype>,
    pub vram_used_bytes: u64,
    pub sage_attention_active: bool,
    pub torch_compiled: bool,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// One video to caption, with the settings frozen at batch start.
#[derive(Debug, Clone)]
pub struct VideoJob {
    pub path: PathBuf,
    pub settings: Arc<Settings>,
}

impl VideoJob {
    pub fn new(path: PathBuf, settings: Arc<Settings>) -> Self {
        Self { path, settings }
    }

    /// File name of the video, used in results and progress.
    pub fn name(&self) -> String {
        video_name(&self.path)
    }
}

pub(crate) fn video_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
