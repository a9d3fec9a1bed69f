pub mod analytics;
pub mod backend;
pub mod caption;
pub mod config;
pub mod decoder;
pub mod library;
pub mod metrics;
pub mod orchestrator;
pub mod settings;
pub mod testing;

pub use backend::{BackendConfig, BackendError, HttpInferenceBackend, InferenceBackend};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, ServerConfig,
};
pub use decoder::{DecoderConfig, DecoderError, FfmpegFrameExtractor, FrameExtractor};
pub use library::{discover_videos, resolve_videos, LibraryConfig, LibraryError, VideoInfo};
pub use orchestrator::{
    BatchOrchestrator, ModelStatus, OrchestratorError, ProcessingResult, ProcessingStage,
    ProcessingSubstage, ProgressSink, ProgressSnapshot,
};
pub use settings::{Device, Dtype, Settings, SettingsError, SettingsUpdate};
