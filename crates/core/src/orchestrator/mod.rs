//! Batch captioning orchestrator.
//!
//! Drives videos through the stage pipeline one at a time:
//! - **Model**: at most one loaded model, owned behind the operation lock
//! - **Stages**: extract frames, encode, generate, persist the caption
//! - **Progress**: a snapshot is reported at every fixed checkpoint

mod batch;
mod lifecycle;
mod reporter;
mod runner;
mod sink;
mod state;
mod types;
mod worker;

pub use batch::BatchOrchestrator;
pub use lifecycle::ModelLifecycleController;
pub use runner::{VideoError, VideoStageRunner};
pub use sink::ProgressSink;
pub use state::{OrchestratorState, StateEvent};
pub use types::{
    ModelStatus, OrchestratorError, ProcessingResult, ProcessingStage, ProcessingSubstage,
    ProgressSnapshot, VideoJob,
};
