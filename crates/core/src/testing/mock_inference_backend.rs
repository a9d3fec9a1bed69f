//! Mock inference backend for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::backend::{
    BackendError, Generation, GenerationParams, InferenceBackend, LoadedModel, ModelConfig,
    ModelHandle, ModelInfo,
};
use crate::decoder::Frame;

/// A recorded generation call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedGeneration {
    pub handle: ModelHandle,
    pub frame_count: usize,
    pub params: GenerationParams,
}

/// Mock implementation of the InferenceBackend trait.
///
/// Provides controllable behavior for testing:
/// - Track loads, unloads and generations for assertions
/// - Fail the next load, or the Nth generation
/// - Slow generation down to exercise stop and concurrency
///
/// # Example
///
/// ```rust,ignore
/// use vidcap_core::testing::MockInferenceBackend;
///
/// let backend = MockInferenceBackend::new();
/// backend.fail_generation_at(1, "CUDA out of memory").await;
///
/// // Second generate_caption call fails, the others succeed
/// ```
#[derive(Debug)]
pub struct MockInferenceBackend {
    next_handle: AtomicU64,
    /// Configs passed to every load attempt, including failed ones.
    loads: Arc<RwLock<Vec<ModelConfig>>>,
    live: Arc<RwLock<HashMap<ModelHandle, ModelInfo>>>,
    unloaded: Arc<RwLock<Vec<ModelHandle>>>,
    generations: Arc<RwLock<Vec<RecordedGeneration>>>,
    /// If set, the next load fails with this message.
    next_load_error: Arc<RwLock<Option<String>>>,
    /// Generation failures keyed by zero-based call index.
    generation_failures: Arc<RwLock<HashMap<usize, String>>>,
    fail_unloads: Arc<RwLock<bool>>,
    caption: Arc<RwLock<String>>,
    output_tokens: Arc<RwLock<u64>>,
    tokens_per_sec: Arc<RwLock<f64>>,
    generation_delay: Arc<RwLock<Duration>>,
    /// Reported while at least one model is live.
    memory_bytes: Arc<RwLock<u64>>,
}

impl Default for MockInferenceBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInferenceBackend {
    /// Create a new mock backend.
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            loads: Arc::new(RwLock::new(Vec::new())),
            live: Arc::new(RwLock::new(HashMap::new())),
            unloaded: Arc::new(RwLock::new(Vec::new())),
            generations: Arc::new(RwLock::new(Vec::new())),
            next_load_error: Arc::new(RwLock::new(None)),
            generation_failures: Arc::new(RwLock::new(HashMap::new())),
            fail_unloads: Arc::new(RwLock::new(false)),
            caption: Arc::new(RwLock::new("A mock caption of the video.".to_string())),
            output_tokens: Arc::new(RwLock::new(64)),
            tokens_per_sec: Arc::new(RwLock::new(32.0)),
            generation_delay: Arc::new(RwLock::new(Duration::ZERO)),
            memory_bytes: Arc::new(RwLock::new(8 * 1024 * 1024 * 1024)),
        }
    }

    /// Set the caption text returned by every generation.
    pub async fn set_caption(&self, caption: impl Into<String>) {
        *self.caption.write().await = caption.into();
    }

    /// Set the token count and rate reported by every generation.
    pub async fn set_generation_stats(&self, output_tokens: u64, tokens_per_sec: f64) {
        *self.output_tokens.write().await = output_tokens;
        *self.tokens_per_sec.write().await = tokens_per_sec;
    }

    /// Make the next load fail with `message`.
    pub async fn fail_next_load(&self, message: impl Into<String>) {
        *self.next_load_error.write().await = Some(message.into());
    }

    /// Make the generation call at `call_index` (zero-based) fail.
    pub async fn fail_generation_at(&self, call_index: usize, message: impl Into<String>) {
        self.generation_failures
            .write()
            .await
            .insert(call_index, message.into());
    }

    /// Make every unload report an error.
    pub async fn fail_unloads(&self, fail: bool) {
        *self.fail_unloads.write().await = fail;
    }

    /// Delay every generation by `delay`.
    pub async fn set_generation_delay(&self, delay: Duration) {
        *self.generation_delay.write().await = delay;
    }

    /// Set the memory figure reported while a model is live.
    pub async fn set_memory_bytes(&self, bytes: u64) {
        *self.memory_bytes.write().await = bytes;
    }

    /// Configs passed to load, in order.
    pub async fn load_calls(&self) -> Vec<ModelConfig> {
        self.loads.read().await.clone()
    }

    pub async fn load_count(&self) -> usize {
        self.loads.read().await.len()
    }

    /// Number of models currently held.
    pub async fn live_models(&self) -> usize {
        self.live.read().await.len()
    }

    pub async fn unloaded_handles(&self) -> Vec<ModelHandle> {
        self.unloaded.read().await.clone()
    }

    pub async fn recorded_generations(&self) -> Vec<RecordedGeneration> {
        self.generations.read().await.clone()
    }

    pub async fn generation_count(&self) -> usize {
        self.generations.read().await.len()
    }
}

#[async_trait]
impl InferenceBackend for MockInferenceBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn load_model(&self, config: &ModelConfig) -> Result<LoadedModel, BackendError> {
        self.loads.write().await.push(config.clone());

        if let Some(message) = self.next_load_error.write().await.take() {
            return Err(BackendError::LoadFailed(message));
        }

        let id = self.next_handle.fetch_add(1, Ordering::SeqCst);
        let handle = ModelHandle::new(format!("mock-model-{}", id));
        let info = ModelInfo {
            model_id: config.model_id.clone(),
            device: format!("{}:0", config.device),
            dtype: config.dtype,
            sage_attention: config.use_sage_attention,
            torch_compiled: config.use_torch_compile,
        };
        self.live.write().await.insert(handle.clone(), info.clone());

        Ok(LoadedModel { handle, info })
    }

    async fn unload_model(&self, handle: &ModelHandle) -> Result<(), BackendError> {
        self.live.write().await.remove(handle);
        self.unloaded.write().await.push(handle.clone());

        if *self.fail_unloads.read().await {
            return Err(BackendError::Http("connection reset".to_string()));
        }
        Ok(())
    }

    async fn generate_caption(
        &self,
        handle: &ModelHandle,
        frames: &[Frame],
        params: &GenerationParams,
    ) -> Result<Generation, BackendError> {
        if !self.live.read().await.contains_key(handle) {
            return Err(BackendError::ModelNotLoaded(handle.to_string()));
        }

        let call_index = {
            let mut generations = self.generations.write().await;
            generations.push(RecordedGeneration {
                handle: handle.clone(),
                frame_count: frames.len(),
                params: params.clone(),
            });
            generations.len() - 1
        };

        let delay = *self.generation_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.generation_failures.read().await.get(&call_index) {
            return Err(BackendError::GenerationFailed(message.clone()));
        }

        Ok(Generation {
            text: self.caption.read().await.clone(),
            output_tokens: *self.output_tokens.read().await,
            tokens_per_sec: *self.tokens_per_sec.read().await,
            num_frames: frames.len(),
        })
    }

    async fn memory_used_bytes(&self) -> u64 {
        if self.live.read().await.is_empty() {
            0
        } else {
            *self.memory_bytes.read().await
        }
    }
}
