//! Frame extraction from video files.
//!
//! The orchestrator only depends on the [`FrameExtractor`] trait; the
//! shipped implementation shells out to ffmpeg/ffprobe.
//!
//! # Example
//!
//! ```ignore
//! use vidcap_core::decoder::{ExtractionParams, FfmpegFrameExtractor, FrameExtractor};
//!
//! let extractor = FfmpegFrameExtractor::with_defaults();
//! extractor.validate().await?;
//!
//! let extracted = extractor
//!     .extract_frames(Path::new("/videos/clip.mp4"), &ExtractionParams { max_frames: 16, frame_size: 336 })
//!     .await?;
//! println!("{} frames from a {:.1}s video", extracted.frames.len(), extracted.metadata.duration_secs);
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::DecoderConfig;
pub use error::DecoderError;
pub use ffmpeg::FfmpegFrameExtractor;
pub use traits::FrameExtractor;
pub use types::{ExtractedFrames, ExtractionParams, Frame, VideoMetadata};
