use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::middleware::metrics_middleware;
use super::{analytics, handlers, model, processing, settings, videos, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Captioning settings
        .route("/settings", get(settings::get_settings).put(settings::update_settings))
        // Model lifecycle
        .route("/model/status", get(model::get_status))
        .route("/model/load", post(model::load))
        .route("/model/unload", post(model::unload))
        // Video library
        .route("/videos", get(videos::list_videos))
        .route("/directory", put(videos::set_directory))
        // Batch processing
        .route("/processing/start", post(processing::start))
        .route("/processing/stop", post(processing::stop))
        .route("/processing/reset", post(processing::reset))
        .route("/processing/progress", get(processing::get_progress))
        // Caption analytics
        .route("/analytics/word-frequency", get(analytics::word_frequency))
        .route("/analytics/ngrams", get(analytics::ngrams))
        .route("/analytics/correlations", get(analytics::correlations))
        // Live progress
        .route("/ws", get(ws::ws_handler));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
