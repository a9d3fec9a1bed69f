//! FFmpeg-based frame extractor.

use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::config::DecoderConfig;
use super::error::DecoderError;
use super::traits::FrameExtractor;
use super::types::{ExtractedFrames, ExtractionParams, Frame, VideoMetadata};

/// Probe result reduced to what frame sampling needs.
#[derive(Debug, Clone, PartialEq)]
struct ProbeInfo {
    duration_secs: f64,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<f32>,
}

/// Frame extractor that pipes raw RGB frames out of ffmpeg.
pub struct FfmpegFrameExtractor {
    config: DecoderConfig,
}

impl FfmpegFrameExtractor {
    /// Creates a new extractor with the given configuration.
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Creates an extractor with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(DecoderConfig::default())
    }

    /// Builds the video filter chain that samples frames evenly over the
    /// duration and letterboxes them into a square.
    fn build_filter(duration_secs: f64, params: &ExtractionParams) -> String {
        let size = params.frame_size;
        let scale = format!(
            "scale={size}:{size}:force_original_aspect_ratio=decrease,pad={size}:{size}:(ow-iw)/2:(oh-ih)/2"
        );
        if duration_secs > 0.0 {
            let rate = params.max_frames as f64 / duration_secs;
            format!("fps={:.6},{}", rate, scale)
        } else {
            scale
        }
    }

    /// Builds ffmpeg arguments that write RGB24 frames to stdout.
    fn build_args(
        &self,
        input: &Path,
        duration_secs: f64,
        params: &ExtractionParams,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            self.config.log_level.clone().into(),
            "-i".into(),
            input.as_os_str().to_owned(),
            "-vf".into(),
            Self::build_filter(duration_secs, params).into(),
            "-frames:v".into(),
            params.max_frames.to_string().into(),
            "-f".into(),
            "rawvideo".into(),
            "-pix_fmt".into(),
            "rgb24".into(),
        ];
        args.push("pipe:1".into());
        args
    }

    /// Parses ffprobe JSON output.
    fn parse_probe_output(path: &Path, output: &str) -> Result<ProbeInfo, DecoderError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            width: Option<u32>,
            height: Option<u32>,
            r_frame_rate: Option<String>,
            duration: Option<String>,
        }

        let probe: ProbeOutput = serde_json::from_str(output)
            .map_err(|e| DecoderError::probe_failed(format!("Failed to parse ffprobe output: {}", e)))?;

        let video = probe
            .streams
            .iter()
            .find(|s| s.codec_type == "video")
            .ok_or_else(|| DecoderError::NoVideoStream {
                path: path.to_path_buf(),
            })?;

        let duration_secs = probe
            .format
            .duration
            .as_ref()
            .or(video.duration.as_ref())
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let fps = video.r_frame_rate.as_ref().and_then(|r| {
            // "24000/1001" or "30/1"
            match r.split_once('/') {
                Some((num, den)) => {
                    let num = num.parse::<f32>().ok()?;
                    let den = den.parse::<f32>().ok()?;
                    if den > 0.0 {
                        Some(num / den)
                    } else {
                        None
                    }
                }
                None => r.parse::<f32>().ok(),
            }
        });

        Ok(ProbeInfo {
            duration_secs,
            width: video.width,
            height: video.height,
            fps,
        })
    }

    /// Splits raw RGB24 output into frames, dropping a trailing partial frame.
    fn split_frames(raw: &[u8], frame_size: u32, max_frames: u32) -> Vec<Frame> {
        let frame_len = Frame::byte_len(frame_size, frame_size);
        if frame_len == 0 {
            return Vec::new();
        }
        raw.chunks_exact(frame_len)
            .take(max_frames as usize)
            .map(|chunk| Frame::new(frame_size, frame_size, chunk.to_vec()))
            .collect()
    }

    async fn probe(&self, path: &Path) -> Result<ProbeInfo, DecoderError> {
        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DecoderError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    DecoderError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(DecoderError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn check_binary(&self, binary: &Path) -> Result<(), std::io::Error> {
        Command::new(binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn extract_frames(
        &self,
        path: &Path,
        params: &ExtractionParams,
    ) -> Result<ExtractedFrames, DecoderError> {
        if params.max_frames == 0 || params.frame_size == 0 {
            return Err(DecoderError::InvalidParams {
                reason: format!(
                    "max_frames={} frame_size={}",
                    params.max_frames, params.frame_size
                ),
            });
        }
        if !path.exists() {
            return Err(DecoderError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let probe = self.probe(path).await?;
        let args = self.build_args(path, probe.duration_secs, params);
        debug!(?path, duration = probe.duration_secs, "Extracting frames");

        let output = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DecoderError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    DecoderError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(DecoderError::extraction_failed(
                format!("ffmpeg exited with {}", output.status),
                Some(stderr),
            ));
        }

        let frames = Self::split_frames(&output.stdout, params.frame_size, params.max_frames);
        if frames.is_empty() {
            return Err(DecoderError::NoFrames {
                path: path.to_path_buf(),
            });
        }

        let metadata = VideoMetadata {
            duration_secs: probe.duration_secs,
            width: probe.width,
            height: probe.height,
            fps: probe.fps,
            frames_extracted: frames.len(),
        };

        Ok(ExtractedFrames { frames, metadata })
    }

    async fn validate(&self) -> Result<(), DecoderError> {
        if let Err(e) = self.check_binary(&self.config.ffmpeg_path).await {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(DecoderError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(DecoderError::Io(e));
        }

        if let Err(e) = self.check_binary(&self.config.ffprobe_path).await {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(DecoderError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(DecoderError::Io(e));
        }

        Ok(())
    }
}
