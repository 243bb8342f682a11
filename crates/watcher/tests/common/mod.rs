//! Shared helpers for watcher tests.
#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use sw_watcher::{StackCapture, StackSnapshot, WatchEvent};
use tokio::sync::mpsc;

/// In-memory log sink for a `tracing` subscriber.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String { String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned() }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

/// Installs a thread-local subscriber. Tasks spawned on a current-thread
/// runtime log through it as well.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buf = LogBuffer::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    (buf, tracing::subscriber::set_default(subscriber))
}

/// Records every `force` value the shutdown callback receives.
#[derive(Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<bool>>>);

impl Calls {
    pub fn callback(&self) -> impl FnOnce(bool) + Send + 'static {
        let calls = self.0.clone();
        move |force| calls.lock().unwrap().push(force)
    }

    pub fn recorded(&self) -> Vec<bool> { self.0.lock().unwrap().clone() }
}

/// Deterministic capture: numbered snapshots of a fixed body.
pub struct NumberedStacks {
    body: &'static str,
    count: AtomicUsize,
}

impl NumberedStacks {
    pub fn new(body: &'static str) -> Self { Self { body, count: AtomicUsize::new(0) } }
}

impl StackCapture for NumberedStacks {
    fn capture(&self, limit: usize) -> StackSnapshot {
        let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        let mut text = format!("snapshot #{n}\n{}", self.body);
        let truncated = text.len() > limit;
        text.truncate(limit);
        StackSnapshot { captured_at: Utc::now(), threads: 1, text, truncated }
    }
}

pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<WatchEvent>) -> WatchEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("watcher did not report an event in time")
        .expect("event channel closed")
}
