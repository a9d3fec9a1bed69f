use std::path::{Path, PathBuf};

/// Extension of caption sidecar files.
pub const CAPTION_EXTENSION: &str = "txt";

/// Longest caption preview returned in a processing result.
pub const PREVIEW_MAX_CHARS: usize = 200;

const SEPARATOR_WIDTH: usize = 60;
const PREVIEW_ELLIPSIS: &str = "...";

/// Marker used to find the footer when reading captions back.
const FOOTER_MARKER: &str = "\n============";

/// Values written into the METADATA footer.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionMetadata {
    pub video_name: String,
    pub frames_processed: usize,
    pub output_tokens: u64,
    pub tokens_per_sec: f64,
}

/// `<dir>/<stem>.txt` for a video at `<dir>/<stem>.<ext>`.
pub fn sidecar_path(video: &Path) -> PathBuf {
    video.with_extension(CAPTION_EXTENSION)
}

/// Renders the full sidecar contents.
pub fn render_sidecar(caption: &str, metadata: Option<&CaptionMetadata>) -> String {
    let mut out = String::from(caption);
    if let Some(meta) = metadata {
        let separator = "=".repeat(SEPARATOR_WIDTH);
        out.push_str("\n\n");
        out.push_str(&separator);
        out.push_str("\nMETADATA\n");
        out.push_str(&separator);
        out.push('\n');
        out.push_str(&format!("Video: {}\n", meta.video_name));
        out.push_str(&format!("Frames processed: {}\n", meta.frames_processed));
        out.push_str(&format!("Output tokens: {}\n", meta.output_tokens));
        out.push_str(&format!("Tokens/sec: {:.1}\n", meta.tokens_per_sec));
    }
    out
}

/// Writes the sidecar next to `video` and returns its path.
pub async fn write_sidecar(
    video: &Path,
    caption: &str,
    metadata: Option<&CaptionMetadata>,
) -> std::io::Result<PathBuf> {
    let path = sidecar_path(video);
    tokio::fs::write(&path, render_sidecar(caption, metadata)).await?;
    Ok(path)
}

/// First [`PREVIEW_MAX_CHARS`] characters of a caption, with `...` appended
/// only when something was cut.
pub fn caption_preview(caption: &str) -> String {
    match caption.char_indices().nth(PREVIEW_MAX_CHARS) {
        Some((cut, _)) => format!("{}{}", &caption[..cut], PREVIEW_ELLIPSIS),
        None => caption.to_string(),
    }
}

/// Caption text with any METADATA footer removed, trimmed.
pub fn strip_metadata(contents: &str) -> &str {
    let body = match contents.find(FOOTER_MARKER) {
        Some(idx) => &contents[..idx],
        None => contents,
    };
    body.trim()
}
