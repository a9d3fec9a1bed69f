use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::AnalyticsError;
use crate::caption::{strip_metadata, CAPTION_EXTENSION};

/// Caption body read back from a sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionText {
    /// Sidecar file stem, which is the video's stem.
    pub video_name: String,
    pub text: String,
}

/// Read caption sidecars under `dir` with their metadata footers removed.
///
/// Hidden files, unreadable files and empty captions are skipped. When
/// `videos` is given, only sidecars whose stem matches one of the names
/// (with or without extension) are read. A missing directory yields no
/// captions.
pub fn read_caption_texts(
    dir: &Path,
    recursive: bool,
    videos: Option<&[String]>,
) -> Result<Vec<CaptionText>, AnalyticsError> {
    if !dir.is_dir() {
        debug!("Caption directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut captions = Vec::new();

    for entry in WalkDir::new(dir).max_depth(max_depth).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|e| e.to_str()) != Some(CAPTION_EXTENSION)
            || entry.file_name().to_string_lossy().starts_with('.')
        {
            continue;
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        if let Some(names) = videos {
            let matches = names.iter().any(|name| {
                name == &stem
                    || Path::new(name)
                        .file_stem()
                        .is_some_and(|s| s.to_string_lossy() == stem)
            });
            if !matches {
                continue;
            }
        }

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Skipping unreadable caption {}: {}", path.display(), e);
                continue;
            }
        };

        let text = strip_metadata(&contents);
        if !text.is_empty() {
            captions.push(CaptionText {
                video_name: stem,
                text: text.to_string(),
            });
        }
    }

    Ok(captions)
}
