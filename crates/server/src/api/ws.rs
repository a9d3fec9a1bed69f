//! WebSocket support for live batch progress.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use vidcap_core::{ProcessingResult, ProgressSink, ProgressSnapshot};

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

/// WebSocket message sent to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Every progress snapshot the orchestrator emits.
    Progress(ProgressSnapshot),
    /// A batch finished; one result per processed video.
    BatchComplete { results: Vec<ProcessingResult> },
}

impl WsMessage {
    fn kind(&self) -> &'static str {
        match self {
            WsMessage::Progress(_) => "progress",
            WsMessage::BatchComplete { .. } => "batch_complete",
        }
    }
}

/// Broadcaster for WebSocket messages using tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsMessage>,
}

impl WsBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast a message to all connected clients.
    pub fn broadcast(&self, msg: WsMessage) {
        // No receivers just means no client is connected
        let _ = self.sender.send(msg);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.sender.subscribe()
    }

    pub fn progress(&self, snapshot: ProgressSnapshot) {
        self.broadcast(WsMessage::Progress(snapshot));
    }

    pub fn batch_complete(&self, results: Vec<ProcessingResult>) {
        self.broadcast(WsMessage::BatchComplete { results });
    }

    /// Progress sink that forwards every snapshot to connected clients.
    pub fn progress_sink(&self) -> ProgressSink {
        let broadcaster = self.clone();
        ProgressSink::blocking(move |snapshot| broadcaster.progress(snapshot))
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.ws_broadcaster().subscribe();

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();
    info!("WebSocket client connected");

    // Start every client from the current state
    let initial = WsMessage::Progress(state.orchestrator().progress().await);

    let send_task = tokio::spawn(async move {
        if send_message(&mut sender, &initial).await.is_err() {
            return;
        }

        loop {
            match rx.recv().await {
                Ok(msg) => {
                    if send_message(&mut sender, &msg).await.is_err() {
                        debug!("WebSocket send failed, client disconnected");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged, skipped {} messages", n);
                    WS_LAG_EVENTS.inc();
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Broadcast channel closed");
                    break;
                }
            }
        }
    });

    // Clients only send control frames
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Text(text)) => {
                debug!("Ignoring text message: {}", text);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}

async fn send_message<S>(sender: &mut S, msg: &WsMessage) -> Result<(), ()>
where
    S: SinkExt<Message> + Unpin,
{
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize WsMessage: {}", e);
            return Ok(());
        }
    };

    WS_MESSAGES_SENT.with_label_values(&[msg.kind()]).inc();
    sender.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidcap_core::ProcessingStage;

    #[test]
    fn test_progress_message_is_tagged_and_flat() {
        let snapshot = ProgressSnapshot {
            stage: ProcessingStage::Processing,
            current_video: Some("a.mp4".to_string()),
            video_index: 1,
            total_videos: 3,
            ..Default::default()
        };

        let json = serde_json::to_value(WsMessage::Progress(snapshot)).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["stage"], "processing");
        assert_eq!(json["current_video"], "a.mp4");
        assert_eq!(json["total_videos"], 3);
    }

    #[test]
    fn test_batch_complete_message() {
        let msg = WsMessage::BatchComplete {
            results: vec![ProcessingResult::failed("b.mp4", "boom")],
        };

        let json = serde_json::to_value(msg).unwrap();
        assert_eq!(json["type"], "batch_complete");
        assert_eq!(json["results"][0]["video_name"], "b.mp4");
        assert_eq!(json["results"][0]["success"], false);
    }

    #[tokio::test]
    async fn test_progress_sink_broadcasts_to_subscribers() {
        let broadcaster = WsBroadcaster::new(8);
        let mut rx = broadcaster.subscribe();

        broadcaster
            .progress_sink()
            .deliver(ProgressSnapshot {
                video_index: 2,
                ..Default::default()
            })
            .await;

        match rx.recv().await.unwrap() {
            WsMessage::Progress(snapshot) => assert_eq!(snapshot.video_index, 2),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_broadcast_without_subscribers_is_ignored() {
        let broadcaster = WsBroadcaster::default();
        broadcaster.batch_complete(Vec::new());
    }
}
