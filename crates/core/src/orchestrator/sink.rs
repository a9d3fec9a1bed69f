//! Progress sinks.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::types::ProgressSnapshot;

type BlockingFn = dyn Fn(ProgressSnapshot) + Send + Sync;
type AwaitableFn = dyn Fn(ProgressSnapshot) -> BoxFuture<'static, ()> + Send + Sync;

/// Receives a snapshot at every progress checkpoint.
///
/// Both flavours are awaited to completion before the orchestrator moves
/// past the checkpoint, so an observer never sees checkpoints out of order.
#[derive(Clone)]
pub enum ProgressSink {
    /// Plain callback, invoked inline.
    Blocking(Arc<BlockingFn>),
    /// Callback returning a future, awaited inline.
    Awaitable(Arc<AwaitableFn>),
}

impl ProgressSink {
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn(ProgressSnapshot) + Send + Sync + 'static,
    {
        Self::Blocking(Arc::new(f))
    }

    pub fn awaitable<F, Fut>(f: F) -> Self
    where
        F: Fn(ProgressSnapshot) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::Awaitable(Arc::new(move |snapshot| f(snapshot).boxed()))
    }

    /// Forward every snapshot into a bounded channel.
    ///
    /// A closed receiver is ignored; the batch keeps running.
    pub fn channel(tx: mpsc::Sender<ProgressSnapshot>) -> Self {
        Self::awaitable(move |snapshot| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(snapshot).await;
            }
        })
    }

    pub async fn deliver(&self, snapshot: ProgressSnapshot) {
        match self {
            Self::Blocking(f) => f(snapshot),
            Self::Awaitable(f) => f(snapshot).await,
        }
    }
}

impl fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocking(_) => f.write_str("ProgressSink::Blocking"),
            Self::Awaitable(_) => f.write_str("ProgressSink::Awaitable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_blocking_sink_records() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let sink = ProgressSink::blocking(move |s| seen_clone.lock().unwrap().push(s.video_index));

        for i in 0..3 {
            sink.deliver(ProgressSnapshot {
                video_index: i,
                ..Default::default()
            })
            .await;
        }

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_awaitable_sink_is_awaited() {
        let seen = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let sink = ProgressSink::awaitable(move |s| {
            let seen = Arc::clone(&seen_clone);
            async move {
                tokio::task::yield_now().await;
                seen.lock().await.push(s.total_videos);
            }
        });

        sink.deliver(ProgressSnapshot {
            total_videos: 7,
            ..Default::default()
        })
        .await;

        assert_eq!(*seen.lock().await, vec![7]);
    }

    #[tokio::test]
    async fn test_channel_sink_forwards() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = ProgressSink::channel(tx);

        sink.deliver(ProgressSnapshot {
            tokens_generated: 12,
            ..Default::default()
        })
        .await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.tokens_generated, 12);
    }

    #[tokio::test]
    async fn test_channel_sink_ignores_closed_receiver() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sink = ProgressSink::channel(tx);
        sink.deliver(ProgressSnapshot::default()).await;
    }
}
