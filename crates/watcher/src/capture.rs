//! Stack snapshots for the diagnostic dump.
//!
//! Rust cannot unwind a foreign thread from the outside, so the default
//! capture combines what the process can see about itself: the dumping
//! thread's own backtrace, the tokio runtime shape, and on Linux the
//! per-thread view under `/proc/self/task`.

use std::backtrace::Backtrace;
use std::fmt::{self, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use sw_core::config::DEFAULT_DUMP_BYTES;

#[derive(Debug, Clone)]
pub struct StackSnapshot {
    pub captured_at: DateTime<Utc>,
    pub threads: usize,
    pub text: String,
    pub truncated: bool,
}

pub trait StackCapture: Send + Sync + 'static {
    /// Capture at most `limit` bytes of stack text.
    fn capture(&self, limit: usize) -> StackSnapshot;
}

#[derive(Debug, Clone, Copy)]
pub struct ProcessStacks { kernel_stacks: bool }

impl ProcessStacks {
    pub fn new(kernel_stacks: bool) -> Self { Self { kernel_stacks } }
}

impl Default for ProcessStacks {
    fn default() -> Self { Self::new(true) }
}

impl StackCapture for ProcessStacks {
    fn capture(&self, limit: usize) -> StackSnapshot {
        let captured_at = Utc::now();
        let mut buf = DumpBuffer::new(limit);
        let _ = writeln!(buf, "pid {} at {}", std::process::id(), captured_at.to_rfc3339_opts(SecondsFormat::Millis, true));
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let m = handle.metrics();
            let _ = writeln!(buf, "runtime {:?}: workers={} alive_tasks={}", handle.runtime_flavor(), m.num_workers(), m.num_alive_tasks());
        }
        let current = std::thread::current();
        let _ = writeln!(buf, "\nthread {:?} (dumping)\n{}", current.name().unwrap_or("<unnamed>"), Backtrace::force_capture());
        let threads = write_threads(&mut buf, self.kernel_stacks);
        let (text, truncated) = buf.finish();
        StackSnapshot { captured_at, threads, text, truncated }
    }
}

#[cfg(target_os = "linux")]
fn write_threads(buf: &mut DumpBuffer, kernel_stacks: bool) -> usize {
    use std::fs;
    use std::path::Path;

    let task = Path::new("/proc/self/task");
    let entries = match fs::read_dir(task) {
        Ok(entries) => entries,
        Err(err) => {
            let _ = writeln!(buf, "thread list unavailable: {err}");
            return 1;
        }
    };
    let mut tids: Vec<u32> = entries
        .filter_map(Result::ok)
        .filter_map(|e| e.file_name().to_str()?.parse().ok())
        .collect();
    tids.sort_unstable();

    for tid in &tids {
        let dir = task.join(tid.to_string());
        let read = |file: &str| fs::read_to_string(dir.join(file)).map(|s| s.trim().to_string()).ok();
        let name = read("comm").unwrap_or_else(|| "?".into());
        let state = read("stat").as_deref().and_then(parse_state).unwrap_or('?');
        let wchan = read("wchan").filter(|w| !w.is_empty() && w != "0").unwrap_or_else(|| "-".into());
        let _ = writeln!(buf, "\nthread {tid} [{name}] state={state} wchan={wchan}");
        if kernel_stacks {
            // Needs CAP_SYS_ADMIN on most kernels; silently skipped otherwise.
            if let Some(stack) = read("stack").filter(|s| !s.is_empty()) {
                let _ = writeln!(buf, "{stack}");
            }
        }
    }
    tids.len()
}

#[cfg(not(target_os = "linux"))]
fn write_threads(_buf: &mut DumpBuffer, _kernel_stacks: bool) -> usize { 1 }

/// `/proc/<pid>/task/<tid>/stat` is `tid (comm) S ...`; comm may hold parens.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_state(stat: &str) -> Option<char> {
    let rest = &stat[stat.rfind(')')? + 1..];
    rest.split_whitespace().next()?.chars().next()
}

/// Text sink that stops accepting once `limit` bytes are held.
pub(crate) struct DumpBuffer {
    text: String,
    limit: usize,
    truncated: bool,
}

impl DumpBuffer {
    pub(crate) fn new(limit: usize) -> Self {
        Self { text: String::with_capacity(limit.min(DEFAULT_DUMP_BYTES)), limit, truncated: false }
    }

    pub(crate) fn push(&mut self, s: &str) {
        let room = self.limit - self.text.len();
        if s.len() <= room {
            self.text.push_str(s);
            return;
        }
        let mut cut = room;
        while !s.is_char_boundary(cut) { cut -= 1; }
        self.text.push_str(&s[..cut]);
        self.truncated = true;
    }

    pub(crate) fn finish(self) -> (String, bool) { (self.text, self.truncated) }
}

impl Write for DumpBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push(s);
        Ok(())
    }
}
