use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

use crate::backend::{GenerationParams, ModelConfig};
use crate::decoder::ExtractionParams;

use super::SettingsError;

pub const DEFAULT_MODEL_ID: &str = "Qwen/Qwen3-VL-8B-Instruct";

pub const DEFAULT_PROMPT: &str = "Describe this video in detail. Include:
- The main subject and their actions
- The setting and environment
- Any notable objects or elements
- The overall mood or atmosphere
- Any text visible in the video";

const MAX_FRAMES_RANGE: RangeInclusive<u32> = 1..=128;
const FRAME_SIZE_RANGE: RangeInclusive<u32> = 224..=672;
const MAX_TOKENS_RANGE: RangeInclusive<u32> = 1..=8192;
const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=2.0;

/// Compute device the model is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Cuda,
    Cpu,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cuda => "cuda",
            Self::Cpu => "cpu",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric precision of the model weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dtype {
    Float16,
    #[default]
    Bfloat16,
    Float32,
}

impl Dtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Float16 => "float16",
            Self::Bfloat16 => "bfloat16",
            Self::Float32 => "float32",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full captioning settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Model identifier understood by the inference backend.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default)]
    pub device: Device,
    #[serde(default)]
    pub dtype: Dtype,
    /// Upper bound on frames sampled per video.
    #[serde(default = "default_max_frames")]
    pub max_frames: u32,
    /// Edge length in pixels of each (square) frame.
    #[serde(default = "default_frame_size")]
    pub frame_size: u32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub use_sage_attention: bool,
    #[serde(default = "default_true")]
    pub use_torch_compile: bool,
    /// Append the METADATA footer to each caption file.
    #[serde(default)]
    pub include_metadata: bool,
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_max_frames() -> u32 {
    16
}

fn default_frame_size() -> u32 {
    336
}

fn default_max_tokens() -> u32 {
    512
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            device: Device::default(),
            dtype: Dtype::default(),
            max_frames: default_max_frames(),
            frame_size: default_frame_size(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            use_sage_attention: false,
            use_torch_compile: true,
            include_metadata: false,
            prompt: default_prompt(),
        }
    }
}

impl Settings {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.model_id.trim().is_empty() {
            return Err(SettingsError::invalid("model_id", "must not be empty"));
        }
        if !MAX_FRAMES_RANGE.contains(&self.max_frames) {
            return Err(SettingsError::invalid(
                "max_frames",
                format!("{} is outside {:?}", self.max_frames, MAX_FRAMES_RANGE),
            ));
        }
        if !FRAME_SIZE_RANGE.contains(&self.frame_size) {
            return Err(SettingsError::invalid(
                "frame_size",
                format!("{} is outside {:?}", self.frame_size, FRAME_SIZE_RANGE),
            ));
        }
        if !MAX_TOKENS_RANGE.contains(&self.max_tokens) {
            return Err(SettingsError::invalid(
                "max_tokens",
                format!("{} is outside {:?}", self.max_tokens, MAX_TOKENS_RANGE),
            ));
        }
        if !TEMPERATURE_RANGE.contains(&self.temperature) {
            return Err(SettingsError::invalid(
                "temperature",
                format!("{} is outside {:?}", self.temperature, TEMPERATURE_RANGE),
            ));
        }
        if self.prompt.trim().is_empty() {
            return Err(SettingsError::invalid("prompt", "must not be empty"));
        }
        Ok(())
    }

    /// Returns a copy with the update applied, validated as a whole.
    pub fn apply(&self, update: SettingsUpdate) -> Result<Settings, SettingsError> {
        let mut next = self.clone();
        if let Some(v) = update.model_id {
            next.model_id = v;
        }
        if let Some(v) = update.device {
            next.device = v;
        }
        if let Some(v) = update.dtype {
            next.dtype = v;
        }
        if let Some(v) = update.max_frames {
            next.max_frames = v;
        }
        if let Some(v) = update.frame_size {
            next.frame_size = v;
        }
        if let Some(v) = update.max_tokens {
            next.max_tokens = v;
        }
        if let Some(v) = update.temperature {
            next.temperature = v;
        }
        if let Some(v) = update.use_sage_attention {
            next.use_sage_attention = v;
        }
        if let Some(v) = update.use_torch_compile {
            next.use_torch_compile = v;
        }
        if let Some(v) = update.include_metadata {
            next.include_metadata = v;
        }
        if let Some(v) = update.prompt {
            next.prompt = v;
        }
        next.validate()?;
        Ok(next)
    }

    /// Whether switching to `other` requires reloading the model.
    pub fn requires_reload(&self, other: &Settings) -> bool {
        self.model_config() != other.model_config()
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            model_id: self.model_id.clone(),
            device: self.device,
            dtype: self.dtype,
            use_sage_attention: self.use_sage_attention,
            use_torch_compile: self.use_torch_compile,
        }
    }

    pub fn extraction_params(&self) -> ExtractionParams {
        ExtractionParams {
            max_frames: self.max_frames,
            frame_size: self.frame_size,
        }
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            prompt: self.prompt.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// Partial settings update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<Dtype>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_frames: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_sage_attention: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_torch_compile: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_metadata: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.model_id, "Qwen/Qwen3-VL-8B-Instruct");
        assert_eq!(settings.device, Device::Cuda);
        assert_eq!(settings.dtype, Dtype::Bfloat16);
        assert_eq!(settings.max_frames, 16);
        assert_eq!(settings.frame_size, 336);
        assert_eq!(settings.max_tokens, 512);
        assert_eq!(settings.temperature, 0.3);
        assert!(!settings.use_sage_attention);
        assert!(settings.use_torch_compile);
        assert!(!settings.include_metadata);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_max_frames_bounds() {
        for ok in [1, 128] {
            let s = Settings {
                max_frames: ok,
                ..Default::default()
            };
            assert!(s.validate().is_ok());
        }
        for bad in [0, 129] {
            let s = Settings {
                max_frames: bad,
                ..Default::default()
            };
            assert_eq!(s.validate().unwrap_err().field(), "max_frames");
        }
    }

    #[test]
    fn test_frame_size_bounds() {
        let ok = Settings {
            frame_size: 672,
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let too_small = Settings {
            frame_size: 200,
            ..Default::default()
        };
        assert_eq!(too_small.validate().unwrap_err().field(), "frame_size");

        let too_big = Settings {
            frame_size: 700,
            ..Default::default()
        };
        assert_eq!(too_big.validate().unwrap_err().field(), "frame_size");
    }

    #[test]
    fn test_temperature_bounds() {
        for ok in [0.0, 2.0] {
            let s = Settings {
                temperature: ok,
                ..Default::default()
            };
            assert!(s.validate().is_ok());
        }
        for bad in [-0.1, 2.1] {
            let s = Settings {
                temperature: bad,
                ..Default::default()
            };
            assert_eq!(s.validate().unwrap_err().field(), "temperature");
        }
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let s = Settings {
            prompt: "   ".to_string(),
            ..Default::default()
        };
        assert_eq!(
            s.validate().unwrap_err().to_string(),
            "invalid prompt: must not be empty"
        );
    }

    #[test]
    fn test_partial_update() {
        let base = Settings::default();
        let update = SettingsUpdate {
            max_frames: Some(8),
            ..Default::default()
        };
        let next = base.apply(update).unwrap();
        assert_eq!(next.max_frames, 8);
        assert_eq!(next.model_id, base.model_id);
        assert_eq!(next.frame_size, base.frame_size);
    }

    #[test]
    fn test_invalid_update_leaves_original() {
        let base = Settings::default();
        let update = SettingsUpdate {
            frame_size: Some(10),
            ..Default::default()
        };
        assert!(base.apply(update).is_err());
        assert_eq!(base.frame_size, 336);
    }

    #[test]
    fn test_deserialize_from_partial_json() {
        let settings: Settings =
            serde_json::from_str(r#"{"device": "cpu", "dtype": "float32", "max_frames": 4}"#)
                .unwrap();
        assert_eq!(settings.device, Device::Cpu);
        assert_eq!(settings.dtype, Dtype::Float32);
        assert_eq!(settings.max_frames, 4);
        assert_eq!(settings.prompt, DEFAULT_PROMPT);
    }

    #[test]
    fn test_requires_reload() {
        let base = Settings::default();
        let prompt_only = Settings {
            prompt: "Short caption".to_string(),
            ..Default::default()
        };
        assert!(!base.requires_reload(&prompt_only));

        let other_device = Settings {
            device: Device::Cpu,
            ..Default::default()
        };
        assert!(base.requires_reload(&other_device));
    }
}
