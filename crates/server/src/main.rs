use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidcap_core::{
    load_config, load_config_from_env, validate_config, BatchOrchestrator, Config,
    FfmpegFrameExtractor, FrameExtractor, HttpInferenceBackend, InferenceBackend,
};
use vidcap_server::api::{create_router, WsBroadcaster};
use vidcap_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = read_config()?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Inference backend: {}", config.backend.base_url);
    match &config.library.video_dir {
        Some(dir) => info!("Video directory: {:?}", dir),
        None => info!("No video directory configured; set one via PUT /api/v1/directory"),
    }

    // Collaborators
    let backend: Arc<dyn InferenceBackend> = Arc::new(
        HttpInferenceBackend::new(config.backend.clone())
            .context("Failed to create inference backend client")?,
    );
    let extractor: Arc<dyn FrameExtractor> =
        Arc::new(FfmpegFrameExtractor::new(config.decoder.clone()));

    // A missing ffmpeg only fails the videos, not startup
    if let Err(e) = extractor.validate().await {
        warn!("Frame extractor not ready: {}", e);
    }

    // Create WebSocket broadcaster before the orchestrator so progress can be forwarded
    let ws_broadcaster = WsBroadcaster::default();
    let orchestrator = Arc::new(
        BatchOrchestrator::new(backend, extractor)
            .with_progress_sink(ws_broadcaster.progress_sink()),
    );
    info!("Batch orchestrator initialized");

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&orchestrator),
        ws_broadcaster,
    ));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Let the current video finish, then release the model
    info!("Server shutting down...");
    orchestrator.stop();
    orchestrator.unload_model().await;
    info!("Model unloaded");

    Ok(())
}

/// Load `VIDCAP_CONFIG` (default `config.toml`), or defaults plus environment
/// when that file does not exist.
fn read_config() -> Result<Config> {
    let config_path = std::env::var("VIDCAP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))
    } else {
        info!(
            "No config file at {:?}; using defaults and environment",
            config_path
        );
        load_config_from_env().context("Failed to load config from environment")
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
