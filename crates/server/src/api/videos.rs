//! Video library handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use vidcap_core::{discover_videos, LibraryError, VideoInfo};

use super::{error_response, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct VideoListResponse {
    pub directory: PathBuf,
    pub videos: Vec<VideoInfo>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct SetDirectoryRequest {
    pub path: PathBuf,
    /// Keep the current setting when omitted.
    #[serde(default)]
    pub recursive: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct DirectoryResponse {
    pub directory: PathBuf,
    pub recursive: bool,
    pub video_count: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// List the videos in the configured directory.
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VideoListResponse>, ApiError> {
    let library = state.library().await;
    let Some(directory) = library.video_dir else {
        return Err(error_response(
            StatusCode::CONFLICT,
            "No video directory configured",
        ));
    };

    let videos = scan(directory.clone(), library.recursive).await?;
    Ok(Json(VideoListResponse {
        directory,
        total: videos.len(),
        videos,
    }))
}

/// Point the library at another directory.
pub async fn set_directory(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetDirectoryRequest>,
) -> Result<Json<DirectoryResponse>, ApiError> {
    let recursive = request
        .recursive
        .unwrap_or(state.library().await.recursive);

    // Rejects a missing directory before it is stored.
    let videos = scan(request.path.clone(), recursive).await?;

    state
        .set_video_dir(request.path.clone(), Some(recursive))
        .await;
    info!(
        "Video directory set to {} ({} videos)",
        request.path.display(),
        videos.len()
    );

    Ok(Json(DirectoryResponse {
        directory: request.path,
        recursive,
        video_count: videos.len(),
    }))
}

async fn scan(
    directory: PathBuf,
    recursive: bool,
) -> Result<Vec<VideoInfo>, ApiError> {
    let result = tokio::task::spawn_blocking(move || discover_videos(&directory, recursive))
        .await
        .map_err(|e| {
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Directory scan failed: {}", e),
            )
        })?;

    result.map_err(library_error)
}

pub(crate) fn library_error(e: LibraryError) -> ApiError {
    let status = match &e {
        LibraryError::DirectoryNotFound(_) | LibraryError::UnknownVideo(_) => {
            StatusCode::NOT_FOUND
        }
        LibraryError::Walk(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, e.to_string())
}
