use std::sync::Arc;
use tokio::sync::RwLock;

use super::sink::ProgressSink;
use super::state::{OrchestratorState, StateEvent};
use super::types::ProgressSnapshot;

/// Applies state events and reports checkpoints to the sink.
#[derive(Debug, Clone)]
pub(crate) struct ProgressReporter {
    state: Arc<RwLock<OrchestratorState>>,
    sink: Option<ProgressSink>,
}

impl ProgressReporter {
    pub(crate) fn new(state: Arc<RwLock<OrchestratorState>>) -> Self {
        Self { state, sink: None }
    }

    pub(crate) fn set_sink(&mut self, sink: ProgressSink) {
        self.sink = Some(sink);
    }

    /// Apply without reporting.
    pub(crate) async fn update(&self, event: StateEvent) -> ProgressSnapshot {
        let mut state = self.state.write().await;
        *state = std::mem::take(&mut *state).apply(event);
        state.snapshot()
    }

    /// Apply and deliver the resulting snapshot. The state lock is released
    /// before the sink runs.
    pub(crate) async fn emit(&self, event: StateEvent) {
        let snapshot = self.update(event).await;
        if let Some(sink) = &self.sink {
            sink.deliver(snapshot).await;
        }
    }

    pub(crate) async fn snapshot(&self) -> ProgressSnapshot {
        self.state.read().await.snapshot()
    }

    pub(crate) async fn replace(&self, state: OrchestratorState) {
        *self.state.write().await = state;
    }
}
