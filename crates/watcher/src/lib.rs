//! Signal watching for long-running processes.
//!
//! Two independent loops run on the tokio runtime:
//! - SIGUSR1 logs a stack snapshot and keeps listening.
//! - SIGHUP, SIGINT, SIGTERM or SIGQUIT invokes the shutdown callback once
//!   (`force == true` only for SIGQUIT) and the loop ends.
//!
//! [`start_watching`] is the process-wide entry point. [`Watcher`] accepts an
//! injected [`SignalSource`] and reports [`WatchEvent`]s so the loops can be
//! driven and observed without real signal delivery.

pub mod capture;
pub mod signal;
pub mod source;
pub mod watcher;

pub use capture::{ProcessStacks, StackCapture, StackSnapshot};
pub use signal::Signal;
pub use source::{channel, OsSignals, SignalSender, SignalSource, SignalStream, SignalStreams};
pub use watcher::{start_watching, ShutdownCallback, WatchEvent, WatchHandles, Watcher, DUMP_BEGIN_MARKER, DUMP_END_MARKER};
