//! Batch orchestrator.
//!
//! One operation lock serialises model loads, unloads and batches. Progress
//! and status reads go through separate short-lived locks so they never wait
//! behind a running batch.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backend::InferenceBackend;
use crate::decoder::FrameExtractor;
use crate::metrics;
use crate::settings::Settings;

use super::lifecycle::ModelLifecycleController;
use super::reporter::ProgressReporter;
use super::runner::VideoStageRunner;
use super::sink::ProgressSink;
use super::state::{OrchestratorState, StateEvent};
use super::types::{
    ModelStatus, OrchestratorError, ProcessingResult, ProgressSnapshot, VideoJob,
};

pub struct BatchOrchestrator {
    backend: Arc<dyn InferenceBackend>,
    runner: VideoStageRunner,
    /// The operation lock. Owns the model handle.
    session: Mutex<ModelLifecycleController>,
    progress: ProgressReporter,
    model_status: RwLock<ModelStatus>,
    stop_requested: AtomicBool,
    processing: AtomicBool,
}

impl BatchOrchestrator {
    pub fn new(backend: Arc<dyn InferenceBackend>, extractor: Arc<dyn FrameExtractor>) -> Self {
        let state = Arc::new(RwLock::new(OrchestratorState::new()));
        Self {
            runner: VideoStageRunner::new(extractor, Arc::clone(&backend)),
            session: Mutex::new(ModelLifecycleController::new(Arc::clone(&backend))),
            backend,
            progress: ProgressReporter::new(state),
            model_status: RwLock::new(ModelStatus::default()),
            stop_requested: AtomicBool::new(false),
            processing: AtomicBool::new(false),
        }
    }

    /// Report every progress checkpoint to `sink`.
    pub fn with_progress_sink(mut self, sink: ProgressSink) -> Self {
        self.progress.set_sink(sink);
        self
    }

    /// Load the model described by `settings`, replacing any loaded model.
    pub async fn load_model(&self, settings: &Settings) -> Result<ModelStatus, OrchestratorError> {
        let mut session = self.session.lock().await;
        self.load_locked(&mut session, settings).await
    }

    async fn load_locked(
        &self,
        session: &mut ModelLifecycleController,
        settings: &Settings,
    ) -> Result<ModelStatus, OrchestratorError> {
        let config = settings.model_config();
        info!("Loading model {} on {}", config.model_id, config.device);
        let start = Instant::now();

        self.progress.emit(StateEvent::LoadStarted).await;

        if session.retire().await {
            debug!("Retired previously loaded model");
        }
        self.publish_status(session, 0).await;
        self.progress.emit(StateEvent::PreviousModelRetired).await;

        let outcome = session.load(&config).await.map(|_| ());
        metrics::MODEL_LOAD_DURATION.observe(start.elapsed().as_secs_f64());

        match outcome {
            Ok(()) => {
                let vram_used_bytes = self.backend.memory_used_bytes().await;
                let status = self.publish_status(session, vram_used_bytes).await;
                self.progress
                    .emit(StateEvent::LoadSucceeded { vram_used_bytes })
                    .await;
                metrics::MODEL_LOADS.with_label_values(&["success"]).inc();
                info!(
                    "Model ready in {:.1}s ({} bytes of device memory)",
                    start.elapsed().as_secs_f64(),
                    vram_used_bytes
                );
                Ok(status)
            }
            Err(message) => {
                self.publish_status(session, 0).await;
                self.progress
                    .emit(StateEvent::LoadFailed {
                        message: message.clone(),
                    })
                    .await;
                metrics::MODEL_LOADS.with_label_values(&["failure"]).inc();
                error!("Model load failed: {}", message);
                Err(OrchestratorError::LoadFailed(message))
            }
        }
    }

    /// Release the loaded model. A no-op when nothing is loaded.
    pub async fn unload_model(&self) {
        let mut session = self.session.lock().await;
        if !session.is_loaded() {
            debug!("Unload requested with no model loaded");
            return;
        }
        session.unload().await;
        self.publish_status(&session, 0).await;
        self.progress.emit(StateEvent::ModelUnloaded).await;
    }

    /// Caption `videos` in order and return one result per attempted video.
    ///
    /// Loads the model first when none is loaded; if that load fails the
    /// batch returns no results. A failure on one video never stops the
    /// others. After [`stop`](Self::stop) the in-flight video finishes and
    /// the rest are skipped.
    pub async fn process_videos(
        &self,
        videos: Vec<PathBuf>,
        settings: &Settings,
    ) -> Vec<ProcessingResult> {
        let mut session = self.session.lock().await;
        let batch_id = Uuid::new_v4();
        info!("Starting batch {} with {} videos", batch_id, videos.len());

        if !session.is_loaded() {
            if let Err(e) = self.load_locked(&mut session, settings).await {
                warn!("Batch {} aborted, model unavailable: {}", batch_id, e);
                metrics::BATCHES.with_label_values(&["load_failed"]).inc();
                return Vec::new();
            }
        } else if session.config() != Some(&settings.model_config()) {
            warn!(
                "Batch {} requests a different model configuration; keeping the loaded model",
                batch_id
            );
        }

        let Some(handle) = session.handle().cloned() else {
            error!("Batch {} has no model handle after load", batch_id);
            metrics::BATCHES.with_label_values(&["load_failed"]).inc();
            return Vec::new();
        };

        self.stop_requested.store(false, Ordering::SeqCst);
        self.processing.store(true, Ordering::SeqCst);

        let settings = Arc::new(settings.clone());
        let total = videos.len();
        let mut results = Vec::with_capacity(total);
        let mut stopped = false;

        self.progress
            .emit(StateEvent::BatchStarted {
                total_videos: total,
            })
            .await;

        for (index, path) in videos.into_iter().enumerate() {
            if self.stop_requested.load(Ordering::SeqCst) {
                info!(
                    "Batch {} stopped, skipping {} remaining videos",
                    batch_id,
                    total - index
                );
                stopped = true;
                break;
            }

            let job = VideoJob::new(path, Arc::clone(&settings));
            debug!("Batch {}: video {}/{} {}", batch_id, index + 1, total, job.name());
            self.progress
                .emit(StateEvent::VideoStarted {
                    index,
                    name: job.name(),
                })
                .await;

            let result = self.runner.run(&job, &handle, &self.progress).await;
            self.progress.update(StateEvent::VideoFinished).await;
            results.push(result);
        }

        self.progress.emit(StateEvent::BatchFinished).await;
        self.processing.store(false, Ordering::SeqCst);

        let succeeded = results.iter().filter(|r| r.success).count();
        info!(
            "Batch {} finished: {} succeeded, {} failed{}",
            batch_id,
            succeeded,
            results.len() - succeeded,
            if stopped { " (stopped)" } else { "" }
        );
        let outcome = if stopped { "stopped" } else { "complete" };
        metrics::BATCHES.with_label_values(&[outcome]).inc();

        results
    }

    /// Ask the running batch to stop after its current video.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        info!("Stop requested");
    }

    /// Return progress to its initial values. The loaded model is kept.
    ///
    /// Rejected while a load or batch holds the operation lock.
    pub async fn reset(&self) -> Result<(), OrchestratorError> {
        let session = self.session.try_lock().map_err(|_| OrchestratorError::Busy)?;
        let vram_used_bytes = if session.is_loaded() {
            self.backend.memory_used_bytes().await
        } else {
            0
        };
        self.progress
            .replace(OrchestratorState::with_model(
                session.is_loaded(),
                vram_used_bytes,
            ))
            .await;
        self.stop_requested.store(false, Ordering::SeqCst);
        info!("Progress reset");
        Ok(())
    }

    pub async fn progress(&self) -> ProgressSnapshot {
        self.progress.snapshot().await
    }

    /// Model status with a fresh device memory reading.
    pub async fn model_status(&self) -> ModelStatus {
        let mut status = self.model_status.read().await.clone();
        if status.loaded {
            status.vram_used_bytes = self.backend.memory_used_bytes().await;
        }
        status
    }

    /// Whether a batch is running.
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Whether a load or batch holds the operation lock.
    pub fn is_busy(&self) -> bool {
        self.session.try_lock().is_err()
    }

    async fn publish_status(
        &self,
        session: &ModelLifecycleController,
        vram_used_bytes: u64,
    ) -> ModelStatus {
        let status = session.status(vram_used_bytes);
        *self.model_status.write().await = status.clone();
        status
    }
}
