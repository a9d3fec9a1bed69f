//! Ownership of the single loaded model.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::{InferenceBackend, LoadedModel, ModelConfig, ModelHandle, ModelInfo};

use super::types::ModelStatus;
use super::worker::offload;

/// Holds at most one model handle at a time.
///
/// Not synchronised on its own: the orchestrator keeps it behind the
/// operation lock so loads, unloads and batches never overlap.
pub struct ModelLifecycleController {
    backend: Arc<dyn InferenceBackend>,
    loaded: Option<LoadedModel>,
    config: Option<ModelConfig>,
    loaded_at: Option<DateTime<Utc>>,
}

impl ModelLifecycleController {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            backend,
            loaded: None,
            config: None,
            loaded_at: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn handle(&self) -> Option<&ModelHandle> {
        self.loaded.as_ref().map(|m| &m.handle)
    }

    /// Configuration the current model was loaded with.
    pub fn config(&self) -> Option<&ModelConfig> {
        self.config.as_ref()
    }

    /// Release the current model, if any. Returns whether one was held.
    ///
    /// The handle is dropped even when the backend reports an error, so a
    /// failed release never leaves a stale handle behind.
    pub async fn retire(&mut self) -> bool {
        let Some(model) = self.loaded.take() else {
            return false;
        };
        self.config = None;
        self.loaded_at = None;

        let backend = Arc::clone(&self.backend);
        let handle = model.handle.clone();
        match offload(async move { backend.unload_model(&handle).await }).await {
            Ok(Ok(())) => info!("Unloaded model {}", model.info.model_id),
            Ok(Err(e)) => warn!("Backend failed to unload {}: {}", model.info.model_id, e),
            Err(e) => warn!("Unload of {} did not finish: {}", model.info.model_id, e),
        }
        true
    }

    /// Load a model, replacing any model already held.
    ///
    /// Errors are returned as the backend's message, unchanged.
    pub async fn load(&mut self, config: &ModelConfig) -> Result<&ModelInfo, String> {
        self.retire().await;

        let backend = Arc::clone(&self.backend);
        let request = config.clone();
        let loaded = offload(async move { backend.load_model(&request).await })
            .await?
            .map_err(|e| e.to_string())?;

        info!(
            "Loaded model {} on {} ({})",
            loaded.info.model_id, loaded.info.device, loaded.info.dtype
        );
        self.config = Some(config.clone());
        self.loaded_at = Some(Utc::now());
        Ok(&self.loaded.insert(loaded).info)
    }

    /// Release the current model. Calling this with nothing loaded is a no-op.
    pub async fn unload(&mut self) {
        self.retire().await;
    }

    /// Status view of the held model with the given memory figure.
    pub fn status(&self, vram_used_bytes: u64) -> ModelStatus {
        match &self.loaded {
            Some(model) => ModelStatus {
                loaded: true,
                model_id: Some(model.info.model_id.clone()),
                device: Some(model.info.device.clone()),
                dtype: Some(model.info.dtype),
                vram_used_bytes,
                sage_attention_active: model.info.sage_attention,
                torch_compiled: model.info.torch_compiled,
                loaded_at: self.loaded_at,
            },
            None => ModelStatus::default(),
        }
    }
}
