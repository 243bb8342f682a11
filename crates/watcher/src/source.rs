//! Where signals come from.
//!
//! [`OsSignals`] registers with the process signal table through tokio.
//! [`channel`] builds an in-memory source so the loops can be driven without
//! real signal delivery.

use async_trait::async_trait;
use sw_core::{WatchError, WatchResult};
use tokio::sync::mpsc;

use crate::signal::Signal;

#[async_trait]
pub trait SignalStream: Send + 'static {
    /// Next signal, or `None` once the source can no longer deliver.
    async fn recv(&mut self) -> Option<Signal>;
}

/// One stream per loop. The two never share a notification channel.
pub struct SignalStreams {
    pub diagnostic: Box<dyn SignalStream>,
    pub shutdown: Box<dyn SignalStream>,
}

pub trait SignalSource {
    fn open(self) -> WatchResult<SignalStreams>;
}

/// The OS signal table is process-global, so it may be opened only once.
#[cfg(unix)]
static OS_SIGNALS_OPENED: once_cell::sync::OnceCell<()> = once_cell::sync::OnceCell::new();

/// The process signal table. Registration happens in [`SignalSource::open`],
/// which has to run inside a tokio runtime. A second open anywhere in the
/// process fails with [`WatchError::AlreadyStarted`].
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSignals;

#[cfg(unix)]
impl SignalSource for OsSignals {
    fn open(self) -> WatchResult<SignalStreams> {
        OS_SIGNALS_OPENED.set(()).map_err(|_| WatchError::AlreadyStarted)?;
        Ok(SignalStreams {
            diagnostic: Box::new(os::OsStream::register(&Signal::DIAGNOSTIC)?),
            shutdown: Box::new(os::OsStream::register(&Signal::SHUTDOWN)?),
        })
    }
}

#[cfg(not(unix))]
impl SignalSource for OsSignals {
    fn open(self) -> WatchResult<SignalStreams> { Err(WatchError::Unsupported) }
}

#[cfg(unix)]
mod os {
    use std::future::poll_fn;
    use std::task::Poll;

    use async_trait::async_trait;
    use sw_core::{WatchError, WatchResult};
    use tokio::signal::unix::{signal, Signal as Listener};
    use tracing::debug;

    use super::SignalStream;
    use crate::signal::Signal;

    pub(super) struct OsStream { listeners: Vec<(Signal, Listener)> }

    impl OsStream {
        pub(super) fn register(set: &[Signal]) -> WatchResult<Self> {
            let mut listeners = Vec::with_capacity(set.len());
            for &sig in set {
                let listener = signal(sig.kind()).map_err(|e| WatchError::register(sig.name(), e))?;
                debug!(signal = %sig, "registered signal handler");
                listeners.push((sig, listener));
            }
            Ok(Self { listeners })
        }
    }

    #[async_trait]
    impl SignalStream for OsStream {
        async fn recv(&mut self) -> Option<Signal> {
            poll_fn(|cx| {
                for (sig, listener) in self.listeners.iter_mut() {
                    match listener.poll_recv(cx) {
                        Poll::Ready(Some(())) => return Poll::Ready(Some(*sig)),
                        Poll::Ready(None) => return Poll::Ready(None),
                        Poll::Pending => {}
                    }
                }
                Poll::Pending
            })
            .await
        }
    }
}

/// In-memory source. Signals pushed through the returned [`SignalSender`]
/// are routed to the loop that owns their class.
pub fn channel() -> (SignalSender, ChannelSource) {
    let (diag_tx, diag_rx) = mpsc::unbounded_channel();
    let (shut_tx, shut_rx) = mpsc::unbounded_channel();
    (SignalSender { diagnostic: diag_tx, shutdown: shut_tx }, ChannelSource { diagnostic: diag_rx, shutdown: shut_rx })
}

#[derive(Debug, Clone)]
pub struct SignalSender {
    diagnostic: mpsc::UnboundedSender<Signal>,
    shutdown: mpsc::UnboundedSender<Signal>,
}

impl SignalSender {
    /// Returns false when the receiving loop has already exited.
    pub fn send(&self, signal: Signal) -> bool {
        let tx = if signal.is_shutdown() { &self.shutdown } else { &self.diagnostic };
        tx.send(signal).is_ok()
    }
}

#[derive(Debug)]
pub struct ChannelSource {
    diagnostic: mpsc::UnboundedReceiver<Signal>,
    shutdown: mpsc::UnboundedReceiver<Signal>,
}

impl SignalSource for ChannelSource {
    fn open(self) -> WatchResult<SignalStreams> {
        Ok(SignalStreams {
            diagnostic: Box::new(ChannelStream(self.diagnostic)),
            shutdown: Box::new(ChannelStream(self.shutdown)),
        })
    }
}

struct ChannelStream(mpsc::UnboundedReceiver<Signal>);

#[async_trait]
impl SignalStream for ChannelStream {
    async fn recv(&mut self) -> Option<Signal> { self.0.recv().await }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_routes_by_class() {
        let (tx, source) = channel();
        let mut streams = source.open().unwrap();
        assert!(tx.send(Signal::Diagnostic));
        assert!(tx.send(Signal::Quit));
        assert_eq!(streams.diagnostic.recv().await, Some(Signal::Diagnostic));
        assert_eq!(streams.shutdown.recv().await, Some(Signal::Quit));
    }

    #[tokio::test]
    async fn send_fails_after_stream_dropped() {
        let (tx, source) = channel();
        let streams = source.open().unwrap();
        drop(streams.shutdown);
        assert!(!tx.send(Signal::Terminate));
        assert!(tx.send(Signal::Diagnostic));
    }

    #[tokio::test]
    async fn stream_ends_when_sender_dropped() {
        let (tx, source) = channel();
        let mut streams = source.open().unwrap();
        drop(tx);
        assert_eq!(streams.diagnostic.recv().await, None);
    }
}
