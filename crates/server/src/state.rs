use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use vidcap_core::{BatchOrchestrator, Config, LibraryConfig, Settings, SettingsError, SettingsUpdate};

use crate::api::WsBroadcaster;

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<BatchOrchestrator>,
    /// Settings used for the next load or batch. Starts from `config.settings`.
    settings: RwLock<Settings>,
    /// Video directory; can be changed at runtime.
    library: RwLock<LibraryConfig>,
    ws_broadcaster: WsBroadcaster,
    /// Set from the moment a batch is accepted until its task finishes.
    batch_claimed: AtomicBool,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: Arc<BatchOrchestrator>,
        ws_broadcaster: WsBroadcaster,
    ) -> Self {
        let settings = RwLock::new(config.settings.clone());
        let library = RwLock::new(config.library.clone());
        Self {
            config,
            orchestrator,
            settings,
            library,
            ws_broadcaster,
            batch_claimed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &Arc<BatchOrchestrator> {
        &self.orchestrator
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }

    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Apply a partial update. The stored settings are left untouched when
    /// the result does not validate.
    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<Settings, SettingsError> {
        let mut settings = self.settings.write().await;
        let updated = settings.apply(update)?;
        *settings = updated.clone();
        Ok(updated)
    }

    /// Claim the right to run the next batch.
    ///
    /// Returns `None` while another batch is claimed or the orchestrator is
    /// busy loading. The claim is released when the guard drops.
    pub fn try_claim_batch(self: &Arc<Self>) -> Option<BatchClaim> {
        if self.orchestrator.is_busy() {
            return None;
        }
        self.batch_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BatchClaim(Arc::clone(self)))
    }

    /// Whether a batch has been accepted or the orchestrator holds its lock.
    pub fn is_busy(&self) -> bool {
        self.batch_claimed.load(Ordering::Acquire) || self.orchestrator.is_busy()
    }

    pub async fn library(&self) -> LibraryConfig {
        self.library.read().await.clone()
    }

    pub async fn set_video_dir(&self, video_dir: PathBuf, recursive: Option<bool>) {
        let mut library = self.library.write().await;
        library.video_dir = Some(video_dir);
        if let Some(recursive) = recursive {
            library.recursive = recursive;
        }
    }
}

/// Held by the task running an accepted batch.
pub struct BatchClaim(Arc<AppState>);

impl Drop for BatchClaim {
    fn drop(&mut self) {
        self.0.batch_claimed.store(false, Ordering::Release);
    }
}
