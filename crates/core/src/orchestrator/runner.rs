//! Per-video stage pipeline: extract, encode, generate, persist.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, Generation, InferenceBackend, ModelHandle};
use crate::caption::{caption_preview, write_sidecar, CaptionMetadata};
use crate::decoder::{DecoderError, FrameExtractor};
use crate::metrics;

use super::reporter::ProgressReporter;
use super::state::{
    StateEvent, DONE_PROGRESS, ENCODING_PROGRESS, EXTRACTING_PROGRESS, GENERATING_PROGRESS,
    PERSISTING_PROGRESS,
};
use super::types::{ProcessingResult, ProcessingSubstage, VideoJob};
use super::worker::offload;

/// Why a single video failed. Rendered with `Display` into the result.
#[derive(Debug, Error)]
pub enum VideoError {
    #[error(transparent)]
    Decode(#[from] DecoderError),

    #[error(transparent)]
    Generate(#[from] BackendError),

    #[error("failed to write caption: {0}")]
    Persist(#[from] std::io::Error),

    #[error("{0}")]
    Worker(String),
}

struct CaptionOutput {
    caption: String,
    output_path: PathBuf,
    generation: Generation,
}

/// Runs the stages for one video and turns any failure into a result.
pub struct VideoStageRunner {
    extractor: Arc<dyn FrameExtractor>,
    backend: Arc<dyn InferenceBackend>,
}

impl VideoStageRunner {
    pub fn new(extractor: Arc<dyn FrameExtractor>, backend: Arc<dyn InferenceBackend>) -> Self {
        Self { extractor, backend }
    }

    pub(crate) async fn run(
        &self,
        job: &VideoJob,
        handle: &ModelHandle,
        progress: &ProgressReporter,
    ) -> ProcessingResult {
        let name = job.name();
        let start = Instant::now();

        let result = match self.run_stages(job, handle, progress).await {
            Ok(output) => {
                info!(
                    "Captioned {} ({} tokens, {:.1} tok/s)",
                    name, output.generation.output_tokens, output.generation.tokens_per_sec
                );
                ProcessingResult::succeeded(
                    &name,
                    caption_preview(&output.caption),
                    output.output_path,
                )
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Error processing {}: {}", name, message);
                progress
                    .emit(StateEvent::VideoFailed {
                        message: format!("Error processing {}: {}", name, message),
                    })
                    .await;
                ProcessingResult::failed(&name, message)
            }
        };

        let label = if result.success { "success" } else { "failure" };
        metrics::VIDEOS_PROCESSED.with_label_values(&[label]).inc();
        metrics::VIDEO_DURATION
            .with_label_values(&[label])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    async fn run_stages(
        &self,
        job: &VideoJob,
        handle: &ModelHandle,
        progress: &ProgressReporter,
    ) -> Result<CaptionOutput, VideoError> {
        let settings = &job.settings;

        progress
            .emit(StateEvent::Checkpoint {
                progress: EXTRACTING_PROGRESS,
            })
            .await;

        let extractor = Arc::clone(&self.extractor);
        let path = job.path.clone();
        let params = settings.extraction_params();
        let extracted = offload(async move { extractor.extract_frames(&path, &params).await })
            .await
            .map_err(VideoError::Worker)??;

        debug!(
            "Extracted {} frames from {} ({:.1}s)",
            extracted.frames.len(),
            job.name(),
            extracted.metadata.duration_secs
        );

        progress
            .emit(StateEvent::SubstageEntered {
                substage: ProcessingSubstage::Encoding,
                progress: ENCODING_PROGRESS,
            })
            .await;
        progress
            .emit(StateEvent::SubstageEntered {
                substage: ProcessingSubstage::Generating,
                progress: GENERATING_PROGRESS,
            })
            .await;

        let backend = Arc::clone(&self.backend);
        let handle = handle.clone();
        let params = settings.generation_params();
        let frames = extracted.frames;
        let generation =
            offload(async move { backend.generate_caption(&handle, &frames, &params).await })
                .await
                .map_err(VideoError::Worker)??;

        metrics::TOKENS_GENERATED.inc_by(generation.output_tokens);
        let vram_used_bytes = self.backend.memory_used_bytes().await;
        progress
            .update(StateEvent::GenerationRecorded {
                output_tokens: generation.output_tokens,
                tokens_per_sec: generation.tokens_per_sec,
                vram_used_bytes,
            })
            .await;

        progress
            .emit(StateEvent::Checkpoint {
                progress: PERSISTING_PROGRESS,
            })
            .await;

        let caption = generation.text.clone();
        let metadata = settings.include_metadata.then(|| CaptionMetadata {
            video_name: job.name(),
            frames_processed: generation.num_frames,
            output_tokens: generation.output_tokens,
            tokens_per_sec: generation.tokens_per_sec,
        });
        let output_path = write_sidecar(&job.path, &caption, metadata.as_ref()).await?;

        progress
            .emit(StateEvent::Checkpoint {
                progress: DONE_PROGRESS,
            })
            .await;

        Ok(CaptionOutput {
            caption,
            output_path,
            generation,
        })
    }
}
