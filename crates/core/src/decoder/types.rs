//! Types for the decoder module.

use serde::{Deserialize, Serialize};

/// How many frames to sample and at which size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionParams {
    /// Upper bound on sampled frames.
    pub max_frames: u32,
    /// Edge length of the square output frames, in pixels.
    pub frame_size: u32,
}

/// A decoded frame as packed RGB24.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB bytes, `width * height * 3` long.
    pub rgb: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Self {
        Self { width, height, rgb }
    }

    /// A frame filled with a single color, mostly useful in tests.
    pub fn solid(width: u32, height: u32, color: [u8; 3]) -> Self {
        let pixels = (width * height) as usize;
        let mut rgb = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            rgb.extend_from_slice(&color);
        }
        Self { width, height, rgb }
    }

    /// Expected byte length for the given dimensions.
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgb.len())
            .finish()
    }
}

/// Information about the source video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub duration_secs: f64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f32>,
    /// Number of frames actually returned.
    pub frames_extracted: usize,
}

/// Output of a frame extraction.
#[derive(Debug, Clone)]
pub struct ExtractedFrames {
    pub frames: Vec<Frame>,
    pub metadata: VideoMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_frame_len() {
        let frame = Frame::solid(4, 3, [10, 20, 30]);
        assert_eq!(frame.rgb.len(), Frame::byte_len(4, 3));
        assert_eq!(&frame.rgb[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_frame_debug_omits_pixels() {
        let frame = Frame::solid(2, 2, [0, 0, 0]);
        let debug = format!("{:?}", frame);
        assert!(debug.contains("bytes: 12"));
    }
}
