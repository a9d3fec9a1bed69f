//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock inference and decoding delegates injected, so whole batches
//! run without a GPU, ffmpeg or a network.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use vidcap_core::{
    testing::{MockFrameExtractor, MockInferenceBackend},
    BatchOrchestrator, Config, LibraryConfig, ServerConfig,
};
use vidcap_server::api::{create_router, WsBroadcaster};
use vidcap_server::state::AppState;

/// Re-export fixtures for test convenience
pub use vidcap_core::testing::fixtures;

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() {
///     let fixture = TestFixture::new();
///     let response = fixture.get("/api/v1/health").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state behind the router
    pub state: Arc<AppState>,
    /// Mock backend - scripts captions, failures and delays
    pub backend: Arc<MockInferenceBackend>,
    /// Mock extractor - scripts frame counts and failures
    pub extractor: Arc<MockFrameExtractor>,
    /// Video directory; configured in the library unless `without_video_dir`
    pub video_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture whose library points at an empty temporary video directory.
    pub fn new() -> Self {
        Self::build(true)
    }

    /// Fixture with no video directory configured.
    pub fn without_video_dir() -> Self {
        Self::build(false)
    }

    fn build(with_video_dir: bool) -> Self {
        let video_dir = TempDir::new().expect("Failed to create temp dir");

        let backend = Arc::new(MockInferenceBackend::new());
        let extractor = Arc::new(MockFrameExtractor::new());

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            library: LibraryConfig {
                video_dir: with_video_dir.then(|| video_dir.path().to_path_buf()),
                recursive: false,
            },
            settings: fixtures::test_settings(),
            ..Default::default()
        };

        let ws_broadcaster = WsBroadcaster::default();
        let orchestrator = Arc::new(
            BatchOrchestrator::new(backend.clone(), extractor.clone())
                .with_progress_sink(ws_broadcaster.progress_sink()),
        );

        let state = Arc::new(AppState::new(config, orchestrator, ws_broadcaster));
        let router = create_router(Arc::clone(&state));

        Self {
            router,
            state,
            backend,
            extractor,
            video_dir,
        }
    }

    /// Create placeholder videos in the video directory.
    pub fn add_videos(&self, names: &[&str]) -> Vec<PathBuf> {
        fixtures::video_files(self.video_dir.path(), names)
    }

    pub fn video_path(&self, name: &str) -> PathBuf {
        self.video_dir.path().join(name)
    }

    /// Write a caption sidecar directly, bypassing the orchestrator.
    pub fn write_caption(&self, stem: &str, text: &str) {
        write_file(&self.video_dir.path().join(format!("{}.txt", stem)), text);
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Poll progress until `done` holds or the timeout elapses.
    pub async fn wait_for_progress<F>(&self, timeout: Duration, done: F) -> Value
    where
        F: Fn(&Value) -> bool,
    {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let progress = self.get("/api/v1/processing/progress").await.body;
            if done(&progress) {
                return progress;
            }
            if tokio::time::Instant::now() >= deadline {
                panic!("Timed out waiting for progress, last: {}", progress);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Wait until no load or batch is in flight.
    pub async fn wait_until_idle(&self, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.state.is_busy() {
            if tokio::time::Instant::now() >= deadline {
                panic!("Timed out waiting for the orchestrator to go idle");
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

pub fn write_file(path: &Path, contents: &str) {
    std::fs::write(path, contents).expect("Failed to write file");
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
