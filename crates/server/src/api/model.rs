//! Model lifecycle handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::{error, info};
use vidcap_core::ModelStatus;

use super::{error_response, MessageResponse};
use crate::state::AppState;

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ModelStatus> {
    Json(state.orchestrator().model_status().await)
}

/// Load the model described by the current settings in the background.
///
/// Progress is reported over the WebSocket; poll `/model/status` for the
/// outcome.
pub async fn load(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<MessageResponse>), impl IntoResponse> {
    if state.is_busy() {
        return Err(error_response(
            StatusCode::CONFLICT,
            "A model load or batch is already in progress",
        ));
    }

    let settings = state.settings().await;
    let model_id = settings.model_id.clone();
    let orchestrator = Arc::clone(state.orchestrator());

    tokio::spawn(async move {
        match orchestrator.load_model(&settings).await {
            Ok(status) => info!(
                "Model {} ready ({} bytes of VRAM)",
                status.model_id.unwrap_or_default(),
                status.vram_used_bytes
            ),
            Err(e) => error!("Background model load failed: {}", e),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: format!("Loading model {}", model_id),
        }),
    ))
}

pub async fn unload(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ModelStatus>, impl IntoResponse> {
    if state.is_busy() {
        return Err(error_response(
            StatusCode::CONFLICT,
            "Cannot unload the model while a load or batch is running",
        ));
    }

    state.orchestrator().unload_model().await;
    Ok(Json(state.orchestrator().model_status().await))
}
