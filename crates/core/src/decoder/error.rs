//! Error types for the decoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while extracting frames.
#[derive(Debug, Error)]
pub enum DecoderError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The file has no decodable video stream.
    #[error("No video stream in {path}")]
    NoVideoStream { path: PathBuf },

    /// Failed to probe the video.
    #[error("Failed to probe video: {reason}")]
    ProbeFailed { reason: String },

    /// ffmpeg exited with an error.
    #[error("Frame extraction failed: {reason}")]
    ExtractionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// ffmpeg succeeded but produced no frames.
    #[error("No frames could be extracted from {path}")]
    NoFrames { path: PathBuf },

    /// Invalid extraction parameters.
    #[error("Invalid extraction parameters: {reason}")]
    InvalidParams { reason: String },

    /// I/O error while talking to the subprocess.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecoderError {
    pub fn extraction_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ExtractionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }
}
