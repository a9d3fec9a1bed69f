use std::any::Any;
use std::future::Future;

/// Run `future` on its own task and wait for it.
///
/// Keeps long delegate calls off the orchestrator's task and turns a panic
/// inside the delegate into an ordinary error message.
pub(crate) async fn offload<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(future).await.map_err(|e| {
        if e.is_panic() {
            format!("worker panicked: {}", panic_message(e.into_panic()))
        } else {
            "worker task was cancelled".to_string()
        }
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
