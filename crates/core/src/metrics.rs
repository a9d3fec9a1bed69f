//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Model lifecycle (loads, load latency)
//! - Per-video processing (outcomes, duration, tokens)
//! - Batches

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Model Lifecycle Metrics
// =============================================================================

/// Model loads by result.
pub static MODEL_LOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidcap_model_loads_total", "Total model load attempts"),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

/// Model load duration in seconds.
pub static MODEL_LOAD_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "vidcap_model_load_duration_seconds",
            "Duration of model loads",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0]),
    )
    .unwrap()
});

// =============================================================================
// Video Processing Metrics
// =============================================================================

/// Videos processed by result.
pub static VIDEOS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidcap_videos_processed_total", "Total videos processed"),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

/// Wall time per video in seconds.
pub static VIDEO_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vidcap_video_duration_seconds",
            "Duration of a single video pass",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["result"],
    )
    .unwrap()
});

/// Output tokens generated.
pub static TOKENS_GENERATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidcap_tokens_generated_total",
        "Total output tokens generated",
    )
    .unwrap()
});

// =============================================================================
// Batch Metrics
// =============================================================================

/// Batches by outcome.
pub static BATCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidcap_batches_total", "Total batches run"),
        &["outcome"], // "complete", "stopped", "load_failed"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Model
        Box::new(MODEL_LOADS.clone()),
        Box::new(MODEL_LOAD_DURATION.clone()),
        // Videos
        Box::new(VIDEOS_PROCESSED.clone()),
        Box::new(VIDEO_DURATION.clone()),
        Box::new(TOKENS_GENERATED.clone()),
        // Batches
        Box::new(BATCHES.clone()),
    ]
}
