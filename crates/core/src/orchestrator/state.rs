//! Orchestrator state machine.
//!
//! The state is a plain value. [`OrchestratorState::apply`] is a pure
//! transition from one state to the next; the orchestrator renders a
//! [`ProgressSnapshot`] from the result whenever a checkpoint must be
//! reported.

use std::time::Instant;

use super::types::{ProcessingStage, ProcessingSubstage, ProgressSnapshot};

/// Fixed checkpoints inside a load.
pub const LOAD_RETIRED_PROGRESS: f32 = 0.1;

/// Fixed checkpoints inside a single video.
pub const EXTRACTING_PROGRESS: f32 = 0.2;
pub const ENCODING_PROGRESS: f32 = 0.4;
pub const GENERATING_PROGRESS: f32 = 0.5;
pub const PERSISTING_PROGRESS: f32 = 0.9;
pub const DONE_PROGRESS: f32 = 1.0;

/// Everything that can move the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    LoadStarted,
    /// Any previously loaded model is gone.
    PreviousModelRetired,
    LoadSucceeded { vram_used_bytes: u64 },
    LoadFailed { message: String },
    ModelUnloaded,
    BatchStarted { total_videos: usize },
    VideoStarted { index: usize, name: String },
    SubstageEntered {
        substage: ProcessingSubstage,
        progress: f32,
    },
    Checkpoint { progress: f32 },
    GenerationRecorded {
        output_tokens: u64,
        tokens_per_sec: f64,
        vram_used_bytes: u64,
    },
    VideoFailed { message: String },
    VideoFinished,
    BatchFinished,
}

#[derive(Debug, Clone, Default)]
pub struct OrchestratorState {
    stage: ProcessingStage,
    substage: ProcessingSubstage,
    substage_progress: f32,
    current_video: Option<String>,
    video_index: usize,
    total_videos: usize,
    tokens_generated: u64,
    tokens_per_sec: f64,
    model_loaded: bool,
    vram_used_bytes: u64,
    error_message: Option<String>,
    started_at: Option<Instant>,
}

impl OrchestratorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh state that still reflects an already-loaded model.
    pub fn with_model(model_loaded: bool, vram_used_bytes: u64) -> Self {
        Self {
            model_loaded,
            vram_used_bytes,
            ..Self::default()
        }
    }

    pub fn stage(&self) -> ProcessingStage {
        self.stage
    }

    pub fn model_loaded(&self) -> bool {
        self.model_loaded
    }

    /// Returns the state after `event`.
    pub fn apply(mut self, event: StateEvent) -> Self {
        match event {
            StateEvent::LoadStarted => {
                self.stage = ProcessingStage::LoadingModel;
                self.substage = ProcessingSubstage::Idle;
                self.substage_progress = 0.0;
                self.error_message = None;
                self.started_at = Some(Instant::now());
            }
            StateEvent::PreviousModelRetired => {
                self.model_loaded = false;
                self.substage_progress = LOAD_RETIRED_PROGRESS;
            }
            StateEvent::LoadSucceeded { vram_used_bytes } => {
                self.stage = ProcessingStage::Idle;
                self.model_loaded = true;
                self.vram_used_bytes = vram_used_bytes;
                self.substage_progress = DONE_PROGRESS;
            }
            StateEvent::LoadFailed { message } => {
                self.stage = ProcessingStage::Error;
                self.model_loaded = false;
                self.error_message = Some(message);
            }
            StateEvent::ModelUnloaded => {
                self.model_loaded = false;
                self.vram_used_bytes = 0;
            }
            StateEvent::BatchStarted { total_videos } => {
                self.stage = ProcessingStage::Processing;
                self.substage = ProcessingSubstage::Idle;
                self.substage_progress = 0.0;
                self.total_videos = total_videos;
                self.video_index = 0;
                self.current_video = None;
                self.error_message = None;
                self.started_at = Some(Instant::now());
            }
            StateEvent::VideoStarted { index, name } => {
                self.video_index = index;
                self.current_video = Some(name);
                self.substage = ProcessingSubstage::ExtractingFrames;
                self.substage_progress = 0.0;
            }
            StateEvent::SubstageEntered { substage, progress } => {
                self.substage = substage;
                self.substage_progress = progress.clamp(0.0, 1.0);
            }
            StateEvent::Checkpoint { progress } => {
                self.substage_progress = progress.clamp(0.0, 1.0);
            }
            StateEvent::GenerationRecorded {
                output_tokens,
                tokens_per_sec,
                vram_used_bytes,
            } => {
                self.tokens_generated += output_tokens;
                self.tokens_per_sec = tokens_per_sec;
                self.vram_used_bytes = vram_used_bytes;
            }
            StateEvent::VideoFailed { message } => {
                self.error_message = Some(message);
            }
            StateEvent::VideoFinished => {
                self.substage = ProcessingSubstage::Idle;
            }
            StateEvent::BatchFinished => {
                self.stage = ProcessingStage::Complete;
                self.substage = ProcessingSubstage::Idle;
                self.current_video = None;
            }
        }
        self
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            stage: self.stage,
            substage: self.substage,
            substage_progress: self.substage_progress,
            current_video: self.current_video.clone(),
            video_index: self.video_index,
            total_videos: self.total_videos,
            tokens_generated: self.tokens_generated,
            tokens_per_sec: self.tokens_per_sec,
            model_loaded: self.model_loaded,
            vram_used_bytes: self.vram_used_bytes,
            error_message: self.error_message.clone(),
            elapsed_seconds: self
                .started_at
                .map(|t| t.elapsed().as_secs_f64())
                .unwrap_or(0.0),
        }
    }
}
