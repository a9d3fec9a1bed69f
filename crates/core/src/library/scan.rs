use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use super::{LibraryError, VideoInfo};
use crate::caption::sidecar_path;

/// Recognised video file extensions, lowercase.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm", "m4v", "wmv", "flv"];

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// List videos under `dir`, sorted by name.
pub fn discover_videos(dir: &Path, recursive: bool) -> Result<Vec<VideoInfo>, LibraryError> {
    if !dir.is_dir() {
        return Err(LibraryError::DirectoryNotFound(dir.to_path_buf()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut videos = Vec::new();

    for entry in WalkDir::new(dir)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_video_file(entry.path()) {
            continue;
        }

        let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
        let path = entry.path().to_path_buf();
        videos.push(VideoInfo {
            name: entry.file_name().to_string_lossy().to_string(),
            has_caption: sidecar_path(&path).is_file(),
            size_mb: size_bytes as f64 / (1024.0 * 1024.0),
            path,
        });
    }

    videos.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
    debug!("Found {} videos in {}", videos.len(), dir.display());
    Ok(videos)
}

/// Map requested video names to paths, keeping the requested order.
///
/// Every name must match a video in the library.
pub fn resolve_videos(
    dir: &Path,
    recursive: bool,
    names: &[String],
) -> Result<Vec<PathBuf>, LibraryError> {
    let mut by_name: HashMap<String, PathBuf> = HashMap::new();
    for video in discover_videos(dir, recursive)? {
        by_name.entry(video.name).or_insert(video.path);
    }

    names
        .iter()
        .map(|name| {
            by_name
                .get(name)
                .cloned()
                .ok_or_else(|| LibraryError::UnknownVideo(name.clone()))
        })
        .collect()
}
