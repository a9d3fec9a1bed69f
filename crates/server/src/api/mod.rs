pub mod analytics;
pub mod handlers;
pub mod middleware;
pub mod model;
pub mod processing;
pub mod routes;
pub mod settings;
pub mod videos;
pub mod ws;

pub use routes::create_router;
pub use ws::{WsBroadcaster, WsMessage};

use axum::{http::StatusCode, Json};
use serde::Serialize;

/// Error body shared by every handler.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Simple message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Status plus JSON error body, for handlers that propagate with `?`.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn error_response(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}
