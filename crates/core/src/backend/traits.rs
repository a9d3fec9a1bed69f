//! Trait definitions for the inference backend.

use async_trait::async_trait;

use crate::decoder::Frame;

use super::error::BackendError;
use super::types::{Generation, GenerationParams, LoadedModel, ModelConfig, ModelHandle};

/// A backend that can host a vision-language model.
///
/// Loading and generation are long-running and may exhaust device memory;
/// callers are expected to run them off any latency-sensitive task.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Returns the name of this backend implementation.
    fn name(&self) -> &str;

    /// Loads a model and returns a handle to it.
    async fn load_model(&self, config: &ModelConfig) -> Result<LoadedModel, BackendError>;

    /// Releases a model and its device memory.
    async fn unload_model(&self, handle: &ModelHandle) -> Result<(), BackendError>;

    /// Generates a caption from frames.
    async fn generate_caption(
        &self,
        handle: &ModelHandle,
        frames: &[Frame],
        params: &GenerationParams,
    ) -> Result<Generation, BackendError>;

    /// Device memory currently held by the backend, in bytes.
    async fn memory_used_bytes(&self) -> u64 {
        0
    }
}
