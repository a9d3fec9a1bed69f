//! Captioning settings consumed by the orchestrator.
//!
//! `Settings` carries both the model selection (consumed on load) and the
//! per-batch captioning knobs (consumed on every video). Settings are
//! validated before they reach the orchestrator.

mod types;

pub use types::{Device, Dtype, Settings, SettingsUpdate, DEFAULT_MODEL_ID, DEFAULT_PROMPT};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl SettingsError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Invalid { field, .. } => field,
        }
    }
}
