//! Batch orchestrator integration tests.
//!
//! These drive full batches through the orchestrator with mock delegates:
//! load -> per video (extract -> encode -> generate -> persist) -> complete

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use vidcap_core::orchestrator::{
    BatchOrchestrator, OrchestratorError, ProcessingStage, ProcessingSubstage, ProgressSink,
    ProgressSnapshot,
};
use vidcap_core::testing::{fixtures, MockFrameExtractor, MockInferenceBackend};

/// Test helper holding the orchestrator and its mocks.
struct TestHarness {
    backend: Arc<MockInferenceBackend>,
    extractor: Arc<MockFrameExtractor>,
    snapshots: Arc<Mutex<Vec<ProgressSnapshot>>>,
    orchestrator: Arc<BatchOrchestrator>,
    dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let backend = Arc::new(MockInferenceBackend::new());
        let extractor = Arc::new(MockFrameExtractor::new());
        let snapshots = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&snapshots);
        let sink = ProgressSink::blocking(move |s| recorded.lock().unwrap().push(s));
        let orchestrator = Arc::new(
            BatchOrchestrator::new(backend.clone(), extractor.clone()).with_progress_sink(sink),
        );

        Self {
            backend,
            extractor,
            snapshots,
            orchestrator,
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn videos(&self, names: &[&str]) -> Vec<std::path::PathBuf> {
        fixtures::video_files(self.dir.path(), names)
    }

    fn snapshots(&self) -> Vec<ProgressSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }

    /// Progress values reported while `index` was the current video.
    fn video_progress(&self, index: usize) -> Vec<f32> {
        self.snapshots()
            .iter()
            .filter(|s| s.stage == ProcessingStage::Processing)
            .filter(|s| s.current_video.is_some() && s.video_index == index)
            .map(|s| s.substage_progress)
            .collect()
    }
}

#[tokio::test]
async fn test_three_videos_all_succeed() {
    let h = TestHarness::new();
    let videos = h.videos(&["a.mp4", "b.mp4", "c.mp4"]);

    let results = h
        .orchestrator
        .process_videos(videos.clone(), &fixtures::test_settings())
        .await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.success && r.error.is_none()));
    assert_eq!(
        results.iter().map(|r| r.video_name.as_str()).collect::<Vec<_>>(),
        vec!["a.mp4", "b.mp4", "c.mp4"]
    );

    for video in &videos {
        let sidecar = video.with_extension("txt");
        let contents = std::fs::read_to_string(&sidecar).unwrap();
        assert_eq!(contents, "A mock caption of the video.");
    }
    assert_eq!(
        results[0].output_path.as_deref(),
        Some(videos[0].with_extension("txt").as_path())
    );
    assert_eq!(
        results[0].caption_preview.as_deref(),
        Some("A mock caption of the video.")
    );

    let progress = h.orchestrator.progress().await;
    assert_eq!(progress.stage, ProcessingStage::Complete);
    assert_eq!(progress.substage, ProcessingSubstage::Idle);
    assert!(progress.current_video.is_none());
    assert_eq!(progress.total_videos, 3);
    assert_eq!(progress.tokens_generated, 3 * 64);
    assert!(progress.model_loaded);

    assert_eq!(h.backend.load_count().await, 1);
    assert_eq!(h.backend.generation_count().await, 3);
}

#[tokio::test]
async fn test_load_failure_returns_no_results() {
    let h = TestHarness::new();
    h.backend.fail_next_load("CUDA out of memory").await;
    let videos = h.videos(&["a.mp4", "b.mp4"]);

    let results = h
        .orchestrator
        .process_videos(videos, &fixtures::test_settings())
        .await;

    assert!(results.is_empty());
    assert_eq!(h.extractor.extraction_count().await, 0);

    let snapshots = h.snapshots();
    assert!(snapshots
        .iter()
        .all(|s| s.substage != ProcessingSubstage::ExtractingFrames));
    assert!(snapshots.iter().all(|s| s.current_video.is_none()));
    assert_eq!(
        snapshots.last().map(|s| s.stage),
        Some(ProcessingStage::Error)
    );

    let progress = h.orchestrator.progress().await;
    assert_eq!(progress.stage, ProcessingStage::Error);
    assert!(!progress.model_loaded);
    assert!(progress
        .error_message
        .as_deref()
        .unwrap()
        .contains("CUDA out of memory"));
    assert!(!h.orchestrator.model_status().await.loaded);
}

#[tokio::test]
async fn test_generation_failure_is_isolated() {
    let h = TestHarness::new();
    h.backend.fail_generation_at(1, "CUDA out of memory").await;
    let videos = h.videos(&["a.mp4", "b.mp4", "c.mp4"]);

    let results = h
        .orchestrator
        .process_videos(videos.clone(), &fixtures::test_settings())
        .await;

    assert_eq!(results.len(), 3);
    assert!(results[0].success);
    assert!(!results[1].success);
    assert!(results[2].success);
    assert_eq!(
        results[1].error.as_deref(),
        Some("Generation failed: CUDA out of memory")
    );
    assert!(results[1].caption_preview.is_none());
    assert!(!videos[1].with_extension("txt").exists());
    assert!(videos[2].with_extension("txt").exists());

    let reported = h
        .snapshots()
        .into_iter()
        .filter_map(|s| s.error_message)
        .collect::<Vec<_>>();
    assert!(reported.contains(&"Error processing b.mp4: Generation failed: CUDA out of memory".to_string()));

    let progress = h.orchestrator.progress().await;
    assert_eq!(progress.stage, ProcessingStage::Complete);
    assert_eq!(progress.tokens_generated, 2 * 64);
}

#[tokio::test]
async fn test_extraction_failure_and_panic_are_isolated() {
    let h = TestHarness::new();
    h.extractor.fail_for("a.mp4", "moov atom not found").await;
    h.extractor.panic_for("b.mp4").await;
    let videos = h.videos(&["a.mp4", "b.mp4", "c.mp4"]);

    let results = h
        .orchestrator
        .process_videos(videos, &fixtures::test_settings())
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(
        results[0].error.as_deref(),
        Some("Frame extraction failed: moov atom not found")
    );
    assert_eq!(
        results[1].error.as_deref(),
        Some("worker panicked: mock extractor panicked on b.mp4")
    );
    assert!(results[2].success);
    assert_eq!(h.backend.generation_count().await, 1);
}

#[tokio::test]
async fn test_stop_finishes_current_video_and_skips_rest() {
    let backend = Arc::new(MockInferenceBackend::new());
    backend
        .set_generation_delay(Duration::from_millis(200))
        .await;
    let (tx, mut rx) = mpsc::channel(256);
    let orchestrator = Arc::new(
        BatchOrchestrator::new(backend.clone(), Arc::new(MockFrameExtractor::new()))
            .with_progress_sink(ProgressSink::channel(tx)),
    );
    let dir = TempDir::new().unwrap();
    let videos = fixtures::video_files(dir.path(), &["a.mp4", "b.mp4", "c.mp4"]);

    let batch = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            orchestrator
                .process_videos(videos, &fixtures::test_settings())
                .await
        })
    };

    // Wait until the first video is generating, then stop.
    while let Some(snapshot) = rx.recv().await {
        if snapshot.substage == ProcessingSubstage::Generating {
            assert_eq!(snapshot.video_index, 0);
            assert!(orchestrator.is_processing());
            orchestrator.stop();
            break;
        }
    }

    let results = tokio::time::timeout(Duration::from_secs(5), batch)
        .await
        .expect("batch did not finish")
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert!(dir.path().join("a.txt").exists());
    assert!(!dir.path().join("b.txt").exists());
    assert_eq!(backend.generation_count().await, 1);

    // Nothing was reported for the skipped videos
    let mut remaining = Vec::new();
    while let Ok(snapshot) = rx.try_recv() {
        remaining.push(snapshot);
    }
    assert_eq!(
        remaining.last().map(|s| s.stage),
        Some(ProcessingStage::Complete)
    );
    assert!(remaining
        .iter()
        .all(|s| s.video_index == 0 && s.current_video.as_deref() != Some("b.mp4")));

    let progress = orchestrator.progress().await;
    assert_eq!(progress.stage, ProcessingStage::Complete);
    assert!(!orchestrator.is_processing());
}

#[tokio::test]
async fn test_concurrent_batches_run_one_after_another() {
    let h = TestHarness::new();
    h.backend
        .set_generation_delay(Duration::from_millis(50))
        .await;
    let first_videos = h.videos(&["a1.mp4", "a2.mp4"]);
    let second_videos = h.videos(&["b1.mp4", "b2.mp4"]);

    let first = {
        let orchestrator = Arc::clone(&h.orchestrator);
        tokio::spawn(async move {
            orchestrator
                .process_videos(first_videos, &fixtures::test_settings())
                .await
        })
    };

    // Let the first batch take the operation lock before the second starts
    tokio::time::timeout(Duration::from_secs(5), async {
        while !h
            .snapshots()
            .iter()
            .any(|s| s.current_video.as_deref() == Some("a1.mp4"))
        {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("first batch never started");
    assert!(h.orchestrator.is_busy());

    let second = {
        let orchestrator = Arc::clone(&h.orchestrator);
        tokio::spawn(async move {
            orchestrator
                .process_videos(second_videos, &fixtures::test_settings())
                .await
        })
    };

    let (first, second) = tokio::time::timeout(Duration::from_secs(5), async {
        (first.await.unwrap(), second.await.unwrap())
    })
    .await
    .expect("batches did not finish");

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    assert!(first.iter().chain(second.iter()).all(|r| r.success));

    let named: Vec<String> = h
        .snapshots()
        .into_iter()
        .filter_map(|s| s.current_video)
        .collect();
    let last_first = named
        .iter()
        .rposition(|n| n.starts_with('a'))
        .expect("no snapshots from the first batch");
    let first_second = named
        .iter()
        .position(|n| n.starts_with('b'))
        .expect("no snapshots from the second batch");
    assert!(last_first < first_second, "batches interleaved: {:?}", named);

    assert_eq!(h.backend.load_count().await, 1);
    assert_eq!(h.backend.generation_count().await, 4);
}

#[tokio::test]
async fn test_metadata_footer_written() {
    let h = TestHarness::new();
    h.backend.set_caption("A dog chases a ball.").await;
    h.backend.set_generation_stats(128, 27.46).await;
    let videos = h.videos(&["park.mp4"]);

    let settings = vidcap_core::Settings {
        include_metadata: true,
        ..fixtures::test_settings()
    };
    let results = h.orchestrator.process_videos(videos.clone(), &settings).await;
    assert!(results[0].success);

    let contents = std::fs::read_to_string(videos[0].with_extension("txt")).unwrap();
    let sep = "=".repeat(60);
    assert_eq!(
        contents,
        format!(
            "A dog chases a ball.\n\n{sep}\nMETADATA\n{sep}\nVideo: park.mp4\nFrames processed: 4\nOutput tokens: 128\nTokens/sec: 27.5\n"
        )
    );
    assert_eq!(results[0].caption_preview.as_deref(), Some("A dog chases a ball."));
}

#[tokio::test]
async fn test_checkpoints_are_ordered() {
    let h = TestHarness::new();
    let videos = h.videos(&["a.mp4", "b.mp4"]);

    h.orchestrator
        .process_videos(videos, &fixtures::test_settings())
        .await;

    let expected = vec![0.0, 0.2, 0.4, 0.5, 0.9, 1.0];
    assert_eq!(h.video_progress(0), expected);
    assert_eq!(h.video_progress(1), expected);

    let snapshots = h.snapshots();
    let stages: Vec<_> = snapshots.iter().map(|s| s.stage).collect();
    assert_eq!(stages.first(), Some(&ProcessingStage::LoadingModel));
    assert_eq!(stages.last(), Some(&ProcessingStage::Complete));

    let substages: Vec<_> = snapshots
        .iter()
        .filter(|s| s.stage == ProcessingStage::Processing && s.video_index == 0)
        .filter(|s| s.current_video.is_some())
        .map(|s| s.substage)
        .collect();
    assert_eq!(
        substages,
        vec![
            ProcessingSubstage::ExtractingFrames,
            ProcessingSubstage::ExtractingFrames,
            ProcessingSubstage::Encoding,
            ProcessingSubstage::Generating,
            ProcessingSubstage::Generating,
            ProcessingSubstage::Generating,
        ]
    );
}

#[tokio::test]
async fn test_load_checkpoints() {
    let h = TestHarness::new();

    h.orchestrator
        .load_model(&fixtures::test_settings())
        .await
        .unwrap();

    let load: Vec<_> = h
        .snapshots()
        .iter()
        .map(|s| (s.stage, s.substage_progress, s.model_loaded))
        .collect();
    assert_eq!(
        load,
        vec![
            (ProcessingStage::LoadingModel, 0.0, false),
            (ProcessingStage::LoadingModel, 0.1, false),
            (ProcessingStage::Idle, 1.0, true),
        ]
    );
}

#[tokio::test]
async fn test_awaitable_sink_sees_same_sequence() {
    let backend = Arc::new(MockInferenceBackend::new());
    let seen = Arc::new(tokio::sync::Mutex::new(Vec::new()));
    let recorded = Arc::clone(&seen);
    let sink = ProgressSink::awaitable(move |s: ProgressSnapshot| {
        let recorded = Arc::clone(&recorded);
        async move {
            tokio::task::yield_now().await;
            recorded.lock().await.push(s.substage_progress);
        }
    });
    let orchestrator =
        BatchOrchestrator::new(backend, Arc::new(MockFrameExtractor::new())).with_progress_sink(sink);
    let dir = TempDir::new().unwrap();
    let videos = fixtures::video_files(dir.path(), &["a.mp4"]);

    orchestrator
        .process_videos(videos, &fixtures::test_settings())
        .await;

    // load: 0.0 0.1 1.0, batch start: 0.0, video: 0.0..1.0, complete: 1.0
    assert_eq!(
        *seen.lock().await,
        vec![0.0, 0.1, 1.0, 0.0, 0.0, 0.2, 0.4, 0.5, 0.9, 1.0, 1.0]
    );
}

#[tokio::test]
async fn test_model_loaded_once_across_batches() {
    let h = TestHarness::new();
    let settings = fixtures::test_settings();

    h.orchestrator
        .process_videos(h.videos(&["a.mp4"]), &settings)
        .await;
    h.orchestrator
        .process_videos(h.videos(&["b.mp4"]), &settings)
        .await;

    assert_eq!(h.backend.load_count().await, 1);
    assert_eq!(h.orchestrator.progress().await.tokens_generated, 2 * 64);
}

#[tokio::test]
async fn test_explicit_reload_retires_previous_model() {
    let h = TestHarness::new();
    let settings = fixtures::test_settings();

    h.orchestrator.load_model(&settings).await.unwrap();
    let status = h.orchestrator.load_model(&settings).await.unwrap();

    assert!(status.loaded);
    assert_eq!(h.backend.unloaded_handles().await.len(), 1);
    assert_eq!(h.backend.live_models().await, 1);
}

#[tokio::test]
async fn test_load_error_message_is_verbatim() {
    let h = TestHarness::new();
    h.backend.fail_next_load("weights not found").await;

    let err = h
        .orchestrator
        .load_model(&fixtures::test_settings())
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::LoadFailed(ref m) if m == "Model load failed: weights not found"));
    assert_eq!(
        h.orchestrator.progress().await.error_message.as_deref(),
        Some("Model load failed: weights not found")
    );
}

#[tokio::test]
async fn test_unload_model() {
    let h = TestHarness::new();
    h.orchestrator
        .load_model(&fixtures::test_settings())
        .await
        .unwrap();
    assert!(h.orchestrator.model_status().await.vram_used_bytes > 0);

    h.orchestrator.unload_model().await;
    h.orchestrator.unload_model().await;

    let status = h.orchestrator.model_status().await;
    assert!(!status.loaded);
    assert_eq!(status.vram_used_bytes, 0);
    assert!(!h.orchestrator.progress().await.model_loaded);
    assert_eq!(h.backend.live_models().await, 0);
}

#[tokio::test]
async fn test_reset_rejected_while_busy() {
    let h = TestHarness::new();
    h.backend
        .set_generation_delay(Duration::from_millis(200))
        .await;
    let videos = h.videos(&["a.mp4"]);

    let batch = {
        let orchestrator = Arc::clone(&h.orchestrator);
        tokio::spawn(async move {
            orchestrator
                .process_videos(videos, &fixtures::test_settings())
                .await
        })
    };

    // Progress must stay readable while the batch holds the operation lock.
    let mut saw_busy = false;
    for _ in 0..100 {
        if h.orchestrator.is_busy() {
            saw_busy = true;
            let snapshot =
                tokio::time::timeout(Duration::from_millis(50), h.orchestrator.progress())
                    .await
                    .expect("progress read blocked behind batch");
            assert_ne!(snapshot.stage, ProcessingStage::Complete);
            assert!(matches!(
                h.orchestrator.reset().await,
                Err(OrchestratorError::Busy)
            ));
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(saw_busy);

    batch.await.unwrap();
    h.orchestrator.reset().await.unwrap();

    let progress = h.orchestrator.progress().await;
    assert_eq!(progress.stage, ProcessingStage::Idle);
    assert_eq!(progress.total_videos, 0);
    assert_eq!(progress.tokens_generated, 0);
    assert!(progress.model_loaded);
}
