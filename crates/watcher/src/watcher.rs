use std::sync::Arc;

use sw_core::config::{DiagnosticsSection, DEFAULT_DUMP_BYTES};
use sw_core::WatchResult;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::capture::{ProcessStacks, StackCapture};
use crate::signal::Signal;
use crate::source::{OsSignals, SignalSource, SignalStream};

pub const DUMP_BEGIN_MARKER: &str = "=== Got signal";
pub const DUMP_END_MARKER: &str = "=== Finished dumping stacks ===";

/// Caller-owned shutdown hook. Receives `true` only for SIGQUIT.
pub type ShutdownCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Reported after each loop iteration finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Dumped { signal: Signal, threads: usize, bytes: usize, truncated: bool },
    ShutdownRequested { signal: Signal, force: bool },
}

pub struct Watcher<S> {
    source: S,
    capture: Arc<dyn StackCapture>,
    dump_limit: usize,
    events: Option<mpsc::UnboundedSender<WatchEvent>>,
}

pub struct WatchHandles {
    pub diagnostic: JoinHandle<()>,
    pub shutdown: JoinHandle<()>,
}

impl Watcher<OsSignals> {
    pub fn os() -> Self { Self::new(OsSignals) }

    /// Registers with the OS, launches both loops detached and returns.
    ///
    /// Fails with [`sw_core::WatchError::AlreadyStarted`] once any OS-backed
    /// watcher exists in the process, and with [`sw_core::WatchError::Register`]
    /// if the OS refuses a handler.
    pub fn start<F>(self, on_shutdown: F) -> WatchResult<()>
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let _detached = self.spawn(on_shutdown)?;
        info!("signal watcher started");
        Ok(())
    }
}

impl<S: SignalSource> Watcher<S> {
    pub fn new(source: S) -> Self {
        Self { source, capture: Arc::new(ProcessStacks::default()), dump_limit: DEFAULT_DUMP_BYTES, events: None }
    }

    pub fn configure(self, diagnostics: &DiagnosticsSection) -> Self {
        self.with_capture(ProcessStacks::new(diagnostics.kernel_stacks)).with_dump_limit(diagnostics.max_dump_bytes)
    }

    pub fn with_capture(mut self, capture: impl StackCapture) -> Self {
        self.capture = Arc::new(capture);
        self
    }

    pub fn with_dump_limit(mut self, limit: usize) -> Self {
        self.dump_limit = limit;
        self
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<WatchEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Opens the source and spawns the two loops on the current runtime.
    pub fn spawn<F>(self, on_shutdown: F) -> WatchResult<WatchHandles>
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let streams = self.source.open()?;
        let diagnostic = tokio::spawn(diagnostic_loop(streams.diagnostic, self.capture, self.dump_limit, self.events.clone()));
        let shutdown = tokio::spawn(shutdown_loop(streams.shutdown, Box::new(on_shutdown), self.events));
        Ok(WatchHandles { diagnostic, shutdown })
    }
}

/// Starts the process-wide OS watcher with default diagnostics settings.
pub fn start_watching<F>(on_shutdown: F) -> WatchResult<()>
where
    F: FnOnce(bool) + Send + 'static,
{
    Watcher::os().start(on_shutdown)
}

async fn diagnostic_loop(
    mut stream: Box<dyn SignalStream>,
    capture: Arc<dyn StackCapture>,
    limit: usize,
    events: Option<mpsc::UnboundedSender<WatchEvent>>,
) {
    while let Some(signal) = stream.recv().await {
        let capture = capture.clone();
        // Reads /proc and walks the stack; keep it off the async workers.
        let snapshot = match tokio::task::spawn_blocking(move || capture.capture(limit)).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(signal = %signal, error = %err, "stack capture failed");
                continue;
            }
        };
        info!(
            signal = %signal,
            threads = snapshot.threads,
            truncated = snapshot.truncated,
            "{DUMP_BEGIN_MARKER} {signal}, dumping stacks ===\n{}\n{DUMP_END_MARKER}",
            snapshot.text
        );
        if let Some(tx) = &events {
            let _ = tx.send(WatchEvent::Dumped { signal, threads: snapshot.threads, bytes: snapshot.text.len(), truncated: snapshot.truncated });
        }
    }
    debug!("diagnostic signal source closed");
}

async fn shutdown_loop(
    mut stream: Box<dyn SignalStream>,
    on_shutdown: ShutdownCallback,
    events: Option<mpsc::UnboundedSender<WatchEvent>>,
) {
    let Some(signal) = stream.recv().await else {
        debug!("shutdown signal source closed");
        return;
    };
    // Release the listener before handing control to the caller.
    drop(stream);
    let force = signal.is_force();
    info!(signal = %signal, force, "received shutdown signal");
    on_shutdown(force);
    if let Some(tx) = &events {
        let _ = tx.send(WatchEvent::ShutdownRequested { signal, force });
    }
}
