use tokio::sync::oneshot;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownKind { Graceful, Forced }

impl From<bool> for ShutdownKind {
    fn from(force: bool) -> Self { if force { ShutdownKind::Forced } else { ShutdownKind::Graceful } }
}

/// Bridges the watcher's shutdown callback to the main task.
pub fn shutdown_channel() -> (impl FnOnce(bool) + Send + 'static, oneshot::Receiver<ShutdownKind>) {
    let (tx, rx) = oneshot::channel();
    let on_shutdown = move |force: bool| { let _ = tx.send(ShutdownKind::from(force)); };
    (on_shutdown, rx)
}

pub async fn shutdown_signal(requested: oneshot::Receiver<ShutdownKind>) -> ShutdownKind {
    match requested.await {
        Ok(kind) => kind,
        Err(_) => {
            warn!("shutdown watcher stopped without a request; exiting gracefully");
            ShutdownKind::Graceful
        }
    }
}
