mod app; mod observability; mod shutdown;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use sw_core::config::AppConfig;
use crate::observability::init_tracing;

fn main() -> anyhow::Result<ExitCode> {
    let cfg = Arc::new(AppConfig::load()?);
    init_tracing(&cfg);

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let kind = runtime.block_on(app::run(cfg.clone()))?;
    app::shutdown_runtime(runtime, kind, cfg.grace_period());
    let code = app::exit_code(&cfg, kind);
    info!(?kind, code, "exiting");
    Ok(ExitCode::from(code))
}
