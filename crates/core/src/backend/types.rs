//! Types for the inference backend.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::settings::{Device, Dtype};

/// Everything the backend needs to load a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_id: String,
    pub device: Device,
    pub dtype: Dtype,
    pub use_sage_attention: bool,
    pub use_torch_compile: bool,
}

/// Opaque token identifying a model instance held by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelHandle(String);

impl ModelHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Descriptive metadata reported by the backend after a load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_id: String,
    /// Device the model actually landed on (e.g. "cuda:0").
    pub device: String,
    pub dtype: Dtype,
    /// Whether SageAttention is active (may be false even if requested).
    pub sage_attention: bool,
    /// Whether the model was compiled.
    pub torch_compiled: bool,
}

/// A successfully loaded model.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub handle: ModelHandle,
    pub info: ModelInfo,
}

/// Sampling parameters for a single caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Output of one caption generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    pub output_tokens: u64,
    /// Decode rate measured for this call.
    pub tokens_per_sec: f64,
    /// Frames the model actually consumed.
    pub num_frames: usize,
}
