//! Video library discovery.
//!
//! Lists the videos in a directory and maps requested names back to paths.

mod scan;

pub use scan::{discover_videos, is_video_file, resolve_videos, VIDEO_EXTENSIONS};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Where videos live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Directory scanned for videos. Can be changed at runtime.
    #[serde(default)]
    pub video_dir: Option<PathBuf>,

    /// Descend into subdirectories.
    #[serde(default)]
    pub recursive: bool,
}

/// A video found in the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub name: String,
    pub path: PathBuf,
    pub size_mb: f64,
    /// Whether a caption sidecar already exists next to the video.
    pub has_caption: bool,
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Video not found in library: {0}")]
    UnknownVideo(String),

    #[error("Failed to scan directory: {0}")]
    Walk(#[from] walkdir::Error),
}
