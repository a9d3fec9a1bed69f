//! Batch processing handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use vidcap_core::{discover_videos, resolve_videos, OrchestratorError, ProgressSnapshot};

use super::videos::library_error;
use super::{error_response, ApiError, MessageResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartProcessingRequest {
    /// Videos to caption, by file name. Every video in the directory when
    /// omitted.
    #[serde(default)]
    pub video_names: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct StartProcessingResponse {
    pub success: bool,
    pub message: String,
    pub videos_queued: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// Start captioning a batch in the background.
pub async fn start(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartProcessingRequest>,
) -> Result<(StatusCode, Json<StartProcessingResponse>), ApiError> {
    let Some(claim) = state.try_claim_batch() else {
        return Err(error_response(
            StatusCode::CONFLICT,
            "A model load or batch is already in progress",
        ));
    };

    let library = state.library().await;
    let Some(directory) = library.video_dir else {
        return Err(error_response(
            StatusCode::CONFLICT,
            "No video directory configured",
        ));
    };

    let videos = queued_videos(directory, library.recursive, request.video_names).await?;
    if videos.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "No videos to process",
        ));
    }

    let videos_queued = videos.len();
    let settings = state.settings().await;
    let orchestrator = Arc::clone(state.orchestrator());
    let broadcaster = state.ws_broadcaster().clone();

    tokio::spawn(async move {
        let _claim = claim;
        let results = orchestrator.process_videos(videos, &settings).await;
        broadcaster.batch_complete(results);
    });

    info!("Queued {} videos for captioning", videos_queued);
    Ok((
        StatusCode::ACCEPTED,
        Json(StartProcessingResponse {
            success: true,
            message: format!("Processing {} videos", videos_queued),
            videos_queued,
        }),
    ))
}

/// Ask the running batch to stop after the current video.
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    let message = if state.orchestrator().is_processing() {
        state.orchestrator().stop();
        "Stop requested; the current video will finish first"
    } else if state.is_busy() {
        // The batch clears the stop flag once its model is ready
        "A batch is starting; stop takes effect only once videos start processing"
    } else {
        "No batch is running"
    };
    Json(MessageResponse {
        message: message.to_string(),
    })
}

/// Return progress to idle. Rejected while a load or batch is running.
pub async fn reset(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, ApiError> {
    if state.is_busy() {
        return Err(busy_error());
    }

    match state.orchestrator().reset().await {
        Ok(()) => Ok(Json(MessageResponse {
            message: "Progress reset".to_string(),
        })),
        Err(OrchestratorError::Busy) => Err(busy_error()),
        Err(e) => {
            warn!("Reset failed: {}", e);
            Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

pub async fn get_progress(State(state): State<Arc<AppState>>) -> Json<ProgressSnapshot> {
    Json(state.orchestrator().progress().await)
}

// ============================================================================
// Helpers
// ============================================================================

fn busy_error() -> ApiError {
    error_response(
        StatusCode::CONFLICT,
        "Cannot reset while a model load or batch is running",
    )
}

async fn queued_videos(
    directory: PathBuf,
    recursive: bool,
    names: Option<Vec<String>>,
) -> Result<Vec<PathBuf>, ApiError> {
    let result = tokio::task::spawn_blocking(move || match names {
        Some(names) => resolve_videos(&directory, recursive, &names),
        None => discover_videos(&directory, recursive)
            .map(|videos| videos.into_iter().map(|v| v.path).collect()),
    })
    .await
    .map_err(|e| {
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Directory scan failed: {}", e),
        )
    })?;

    result.map_err(library_error)
}
