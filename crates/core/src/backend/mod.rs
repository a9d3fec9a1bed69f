//! Inference backend abstraction.
//!
//! A backend loads a vision-language model and turns a set of frames plus a
//! prompt into a caption. The orchestrator never touches model internals;
//! it only holds the opaque [`ModelHandle`] returned by a load.

mod config;
mod error;
mod http;
mod traits;
mod types;

pub use config::BackendConfig;
pub use error::BackendError;
pub use http::HttpInferenceBackend;
pub use traits::InferenceBackend;
pub use types::{Generation, GenerationParams, LoadedModel, ModelConfig, ModelHandle, ModelInfo};
