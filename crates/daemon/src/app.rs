use std::sync::Arc;
use std::time::Duration;

use sw_core::config::AppConfig;
use sw_watcher::Watcher;
use tracing::{info, warn};

use crate::shutdown::{shutdown_channel, shutdown_signal, ShutdownKind};

pub async fn run(cfg: Arc<AppConfig>) -> anyhow::Result<ShutdownKind> {
    let (on_shutdown, requested) = shutdown_channel();
    Watcher::os().configure(&cfg.diagnostics).start(on_shutdown)?;
    info!(app = %cfg.app.name, env = %cfg.app.env, pid = std::process::id(), "watching signals (SIGUSR1 dumps stacks)");
    Ok(report(&cfg, shutdown_signal(requested).await))
}

fn report(cfg: &AppConfig, kind: ShutdownKind) -> ShutdownKind {
    match kind {
        ShutdownKind::Forced => warn!(exit_code = cfg.shutdown.force_exit_code, "forced shutdown requested"),
        ShutdownKind::Graceful => info!(grace_secs = cfg.shutdown.grace_period_secs, "graceful shutdown requested"),
    }
    kind
}

/// Tears the runtime down. A graceful exit lets blocking work such as an
/// in-flight stack dump finish within `grace`; a forced exit waits for nothing.
pub fn shutdown_runtime(runtime: tokio::runtime::Runtime, kind: ShutdownKind, grace: Duration) {
    match kind {
        ShutdownKind::Graceful => runtime.shutdown_timeout(grace),
        ShutdownKind::Forced => runtime.shutdown_background(),
    }
}

pub fn exit_code(cfg: &AppConfig, kind: ShutdownKind) -> u8 {
    match kind {
        ShutdownKind::Graceful => 0,
        ShutdownKind::Forced => cfg.shutdown.force_exit_code,
    }
}
