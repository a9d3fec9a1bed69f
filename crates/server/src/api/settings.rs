//! Captioning settings handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::{info, warn};
use vidcap_core::{Settings, SettingsUpdate};

use super::error_response;
use crate::state::AppState;

/// Current captioning settings
pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<Settings> {
    Json(state.settings().await)
}

/// Partially update the captioning settings.
///
/// Only the provided fields change. An update that would leave the settings
/// invalid is rejected with 422 and nothing is stored.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<Settings>, impl IntoResponse> {
    match state.update_settings(update).await {
        Ok(settings) => {
            info!(model_id = %settings.model_id, "Settings updated");
            Ok(Json(settings))
        }
        Err(e) => {
            warn!("Rejected settings update: {}", e);
            Err(error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
    }
}
