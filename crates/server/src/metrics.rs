//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the vidcap server:
//! - HTTP request metrics (latency, counts)
//! - WebSocket connection metrics
//! - Model and batch status (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vidcap_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidcap_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidcap_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

/// Active WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidcap_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .unwrap()
});

/// Total WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidcap_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .unwrap()
});

/// WebSocket messages sent by type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidcap_ws_messages_sent_total", "WebSocket messages sent"),
        &["type"],
    )
    .unwrap()
});

/// WebSocket lag events (when client falls behind).
pub static WS_LAG_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidcap_ws_lag_events_total",
        "WebSocket lag events (client fell behind)",
    )
    .unwrap()
});

// =============================================================================
// Orchestrator Metrics (collected dynamically)
// =============================================================================

/// Whether a model is loaded (1) or not (0).
pub static MODEL_LOADED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("vidcap_model_loaded", "Whether a model is loaded (1) or not (0)").unwrap()
});

/// Accelerator memory reported by the backend.
pub static MODEL_VRAM_BYTES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidcap_model_vram_bytes",
        "Accelerator memory in use by the inference backend",
    )
    .unwrap()
});

/// Whether a batch is running (1) or not (0).
pub static PROCESSING_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidcap_processing_active",
        "Whether a batch is running (1) or not (0)",
    )
    .unwrap()
});

/// Zero-based index of the video being processed.
pub static BATCH_VIDEO_INDEX: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidcap_batch_video_index",
        "Index of the video currently being processed",
    )
    .unwrap()
});

/// Videos in the current or last batch.
pub static BATCH_TOTAL_VIDEOS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("vidcap_batch_total_videos", "Videos in the current batch").unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // WebSocket
    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_MESSAGES_SENT.clone()))
        .unwrap();
    registry.register(Box::new(WS_LAG_EVENTS.clone())).unwrap();

    // Orchestrator
    registry.register(Box::new(MODEL_LOADED.clone())).unwrap();
    registry
        .register(Box::new(MODEL_VRAM_BYTES.clone()))
        .unwrap();
    registry
        .register(Box::new(PROCESSING_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(BATCH_VIDEO_INDEX.clone()))
        .unwrap();
    registry
        .register(Box::new(BATCH_TOTAL_VIDEOS.clone()))
        .unwrap();

    // Core metrics (model loads, videos, batches)
    for metric in vidcap_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the gauges reflect the orchestrator as of the
/// scrape.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let orchestrator = state.orchestrator();

    let status = orchestrator.model_status().await;
    MODEL_LOADED.set(i64::from(status.loaded));
    MODEL_VRAM_BYTES.set(i64::try_from(status.vram_used_bytes).unwrap_or(i64::MAX));

    let progress = orchestrator.progress().await;
    PROCESSING_ACTIVE.set(i64::from(orchestrator.is_processing()));
    BATCH_VIDEO_INDEX.set(progress.video_index as i64);
    BATCH_TOTAL_VIDEOS.set(progress.total_videos as i64);
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    static UUID: Lazy<regex_lite::Regex> = Lazy::new(|| {
        regex_lite::Regex::new(
            r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
        )
        .unwrap()
    });
    static NUMERIC: Lazy<regex_lite::Regex> =
        Lazy::new(|| regex_lite::Regex::new(r"/\d+(/|$)").unwrap());

    let result = UUID.replace_all(path, "{id}");
    let result = NUMERIC.replace_all(&result, "/{id}$1");
    result.to_string()
}
