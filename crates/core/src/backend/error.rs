//! Error types for the inference backend.

use std::time::Duration;
use thiserror::Error;

/// Errors returned by an inference backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("Failed to decode backend response: {0}")]
    Decode(String),

    /// The request took longer than allowed.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// The handle is unknown to the backend.
    #[error("Model not loaded: {0}")]
    ModelNotLoaded(String),

    /// The model failed to load.
    #[error("Model load failed: {0}")]
    LoadFailed(String),

    /// Generation failed.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Http(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackendError::Api {
            status: 507,
            message: "CUDA out of memory".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 507 - CUDA out of memory");

        let err = BackendError::LoadFailed("weights missing".to_string());
        assert_eq!(err.to_string(), "Model load failed: weights missing");
    }
}
