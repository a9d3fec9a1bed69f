//! HTTP client for a remote inference service.
//!
//! Wire protocol:
//! - `POST   /v1/models`                   load, JSON [`ModelConfig`] in, [`LoadResponse`] out
//! - `DELETE /v1/models/{handle}`          unload
//! - `POST   /v1/models/{handle}/generate` multipart: a `params` JSON part and one
//!   `frame` part per frame (raw RGB24)
//! - `GET    /v1/memory`                   `{"allocated_bytes": u64}`

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::decoder::Frame;
use crate::settings::Dtype;

use super::config::BackendConfig;
use super::error::BackendError;
use super::traits::InferenceBackend;
use super::types::{Generation, GenerationParams, LoadedModel, ModelConfig, ModelHandle, ModelInfo};

#[derive(Debug, Deserialize)]
struct LoadResponse {
    handle: String,
    model_id: String,
    device: String,
    dtype: Dtype,
    #[serde(default)]
    sage_attention: bool,
    #[serde(default)]
    torch_compiled: bool,
}

#[derive(Debug, Serialize)]
struct GenerateParams<'a> {
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    frame_width: u32,
    frame_height: u32,
    num_frames: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    text: String,
    output_tokens: u64,
    tokens_per_sec: f64,
    #[serde(default)]
    num_frames: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct MemoryResponse {
    allocated_bytes: u64,
}

/// Inference backend reached over HTTP.
pub struct HttpInferenceBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl HttpInferenceBackend {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| BackendError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn model_url(&self, handle: &ModelHandle, suffix: &str) -> String {
        self.url(&format!(
            "/v1/models/{}{}",
            urlencoding::encode(handle.as_str()),
            suffix
        ))
    }

    fn map_send_error(e: reqwest::Error, timeout: Duration) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(timeout)
        } else {
            BackendError::from(e)
        }
    }

    /// Turns a non-success response into an `Api` error, preferring the
    /// service's `detail`/`error` field over the raw body.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Api {
            status: status.as_u16(),
            message: api_error_message(&body),
        })
    }

    fn build_form(frames: &[Frame], params: &GenerationParams) -> Result<Form, BackendError> {
        let (frame_width, frame_height) = frames
            .first()
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0));

        let params_json = serde_json::to_string(&GenerateParams {
            prompt: &params.prompt,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            frame_width,
            frame_height,
            num_frames: frames.len(),
        })
        .map_err(|e| BackendError::Decode(e.to_string()))?;

        let params_part = Part::text(params_json)
            .mime_str("application/json")
            .map_err(|e| BackendError::Http(e.to_string()))?;
        let mut form = Form::new().part("params", params_part);

        for (i, frame) in frames.iter().enumerate() {
            let part = Part::bytes(frame.rgb.clone())
                .file_name(format!("frame-{:03}.rgb", i))
                .mime_str("application/octet-stream")
                .map_err(|e| BackendError::Http(e.to_string()))?;
            form = form.part("frame", part);
        }

        Ok(form)
    }
}

/// Extracts a human-readable message from an error body.
fn api_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: Option<String>,
        error: Option<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Some(msg), ..
        })
        | Ok(ErrorBody {
            error: Some(msg), ..
        }) => msg,
        _ => body.trim().to_string(),
    }
}

#[async_trait]
impl InferenceBackend for HttpInferenceBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn load_model(&self, config: &ModelConfig) -> Result<LoadedModel, BackendError> {
        let timeout = self.config.load_timeout();
        debug!(model_id = %config.model_id, url = %self.config.base_url, "Requesting model load");

        let response = self
            .client
            .post(self.url("/v1/models"))
            .timeout(timeout)
            .json(config)
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, timeout))?;

        let loaded: LoadResponse = Self::check_status(response).await?.json().await?;

        Ok(LoadedModel {
            handle: ModelHandle::new(loaded.handle),
            info: ModelInfo {
                model_id: loaded.model_id,
                device: loaded.device,
                dtype: loaded.dtype,
                sage_attention: loaded.sage_attention,
                torch_compiled: loaded.torch_compiled,
            },
        })
    }

    async fn unload_model(&self, handle: &ModelHandle) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(self.model_url(handle, ""))
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, self.config.timeout()))?;

        match response.status().as_u16() {
            // Already gone counts as unloaded.
            404 => Ok(()),
            _ => Self::check_status(response).await.map(|_| ()),
        }
    }

    async fn generate_caption(
        &self,
        handle: &ModelHandle,
        frames: &[Frame],
        params: &GenerationParams,
    ) -> Result<Generation, BackendError> {
        let form = Self::build_form(frames, params)?;

        let response = self
            .client
            .post(self.model_url(handle, "/generate"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, self.config.timeout()))?;

        if response.status().as_u16() == 404 {
            return Err(BackendError::ModelNotLoaded(handle.to_string()));
        }

        let generated: GenerateResponse = Self::check_status(response).await?.json().await?;

        Ok(Generation {
            text: generated.text,
            output_tokens: generated.output_tokens,
            tokens_per_sec: generated.tokens_per_sec,
            num_frames: generated.num_frames.unwrap_or(frames.len()),
        })
    }

    async fn memory_used_bytes(&self) -> u64 {
        let result = async {
            let response = self.client.get(self.url("/v1/memory")).send().await?;
            let memory: MemoryResponse = Self::check_status(response).await?.json().await?;
            Ok::<_, BackendError>(memory.allocated_bytes)
        }
        .await;

        match result {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Memory query failed: {}", e);
                0
            }
        }
    }
}
