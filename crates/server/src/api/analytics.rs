//! Caption analytics handlers.
//!
//! Statistics are computed over the caption sidecars in the current video
//! directory on every request.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vidcap_core::analytics::{
    self, read_caption_texts, AnalyticsError, CorrelationOptions, FrequencyOptions,
    NgramFrequency, NgramOptions, StopwordPreset, Stopwords, WordCorrelation, WordFrequency,
};

use super::{error_response, ApiError};
use crate::state::AppState;

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct WordFrequencyParams {
    /// `none`, `minimal` or `english` (default).
    pub stopwords: Option<String>,
    /// Extra stopwords, comma separated.
    pub custom_stopwords: Option<String>,
    pub min_word_length: Option<usize>,
    pub top_n: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NgramParams {
    pub n: Option<usize>,
    pub stopwords: Option<String>,
    pub custom_stopwords: Option<String>,
    pub min_word_length: Option<usize>,
    pub top_n: Option<usize>,
    pub min_count: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CorrelationParams {
    pub stopwords: Option<String>,
    pub custom_stopwords: Option<String>,
    pub min_word_length: Option<usize>,
    pub window_size: Option<usize>,
    pub min_co_occurrence: Option<usize>,
    pub top_n: Option<usize>,
}

/// Statistic results plus the number of captions they were computed over.
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse<T> {
    pub total_captions: usize,
    pub results: Vec<T>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn word_frequency(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WordFrequencyParams>,
) -> Result<Json<AnalyticsResponse<WordFrequency>>, ApiError> {
    let defaults = FrequencyOptions::default();
    let opts = FrequencyOptions {
        stopwords: stopwords(params.stopwords.as_deref(), params.custom_stopwords.as_deref()),
        min_word_length: params.min_word_length.unwrap_or(defaults.min_word_length),
        top_n: params.top_n.unwrap_or(defaults.top_n),
    };

    let texts = caption_texts(&state).await?;
    Ok(Json(AnalyticsResponse {
        total_captions: texts.len(),
        results: analytics::word_frequency(&texts, &opts),
    }))
}

pub async fn ngrams(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NgramParams>,
) -> Result<Json<AnalyticsResponse<NgramFrequency>>, ApiError> {
    let defaults = NgramOptions::default();
    let opts = NgramOptions {
        stopwords: stopwords(params.stopwords.as_deref(), params.custom_stopwords.as_deref()),
        min_word_length: params.min_word_length.unwrap_or(defaults.min_word_length),
        top_n: params.top_n.unwrap_or(defaults.top_n),
        min_count: params.min_count.unwrap_or(defaults.min_count),
    };

    let texts = caption_texts(&state).await?;
    let results =
        analytics::ngrams(&texts, params.n.unwrap_or(2), &opts).map_err(analytics_error)?;
    Ok(Json(AnalyticsResponse {
        total_captions: texts.len(),
        results,
    }))
}

pub async fn correlations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CorrelationParams>,
) -> Result<Json<AnalyticsResponse<WordCorrelation>>, ApiError> {
    let defaults = CorrelationOptions::default();
    let opts = CorrelationOptions {
        stopwords: stopwords(params.stopwords.as_deref(), params.custom_stopwords.as_deref()),
        min_word_length: params.min_word_length.unwrap_or(defaults.min_word_length),
        window_size: params.window_size.unwrap_or(defaults.window_size),
        min_co_occurrence: params.min_co_occurrence.unwrap_or(defaults.min_co_occurrence),
        top_n: params.top_n.unwrap_or(defaults.top_n),
    };

    let texts = caption_texts(&state).await?;
    Ok(Json(AnalyticsResponse {
        total_captions: texts.len(),
        results: analytics::word_correlations(&texts, &opts),
    }))
}

// ============================================================================
// Helpers
// ============================================================================

fn stopwords(preset: Option<&str>, custom: Option<&str>) -> Stopwords {
    let preset: StopwordPreset = preset
        .and_then(|p| p.parse().ok())
        .unwrap_or_default();
    let custom: Vec<&str> = custom
        .map(|c| c.split(',').map(str::trim).filter(|w| !w.is_empty()).collect())
        .unwrap_or_default();
    Stopwords::new(preset, &custom)
}

async fn caption_texts(state: &AppState) -> Result<Vec<String>, ApiError> {
    let library = state.library().await;
    let Some(directory) = library.video_dir else {
        return Err(error_response(
            StatusCode::CONFLICT,
            "No video directory configured",
        ));
    };

    let captions =
        tokio::task::spawn_blocking(move || read_caption_texts(&directory, library.recursive, None))
            .await
            .map_err(|e| {
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Caption scan failed: {}", e),
                )
            })?
            .map_err(analytics_error)?;

    Ok(captions.into_iter().map(|c| c.text).collect())
}

fn analytics_error(e: AnalyticsError) -> ApiError {
    let status = match &e {
        AnalyticsError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
        AnalyticsError::Walk(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, e.to_string())
}
