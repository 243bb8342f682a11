use serde::Deserialize;
use std::{env, time::Duration};

/// Smallest dump budget accepted; anything lower cannot hold a single backtrace.
pub const MIN_DUMP_BYTES: usize = 1024;
pub const DEFAULT_DUMP_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSection,
    pub logging: LoggingSection,
    pub diagnostics: DiagnosticsSection,
    pub shutdown: ShutdownSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub env: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    pub log_format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticsSection {
    pub max_dump_bytes: usize,
    pub kernel_stacks: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShutdownSection {
    pub grace_period_secs: u64,
    pub force_exit_code: u8,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        // Load .env if present
        let _ = dotenvy::dotenv();
        let builder = config::Config::builder()
            .set_default("app.env", env_or("APP_ENV", "local"))?
            .set_default("app.name", env_or("APP_NAME", "sigwatchd"))?
            .set_default("logging.log_format", env_or("LOG_FORMAT", "text"))?
            .set_default("diagnostics.max_dump_bytes", env_or("DIAG_MAX_DUMP_BYTES", &DEFAULT_DUMP_BYTES.to_string()))?
            .set_default("diagnostics.kernel_stacks", env_or("DIAG_KERNEL_STACKS", "true"))?
            .set_default("shutdown.grace_period_secs", env_or("SHUTDOWN_GRACE_PERIOD_SECS", "10"))?
            .set_default("shutdown.force_exit_code", env_or("SHUTDOWN_FORCE_EXIT_CODE", "1"))?;

        let cfg: AppConfig = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.diagnostics.max_dump_bytes < MIN_DUMP_BYTES {
            anyhow::bail!("DIAG_MAX_DUMP_BYTES must be at least {MIN_DUMP_BYTES}, got {}", self.diagnostics.max_dump_bytes);
        }
        if self.shutdown.force_exit_code == 0 {
            anyhow::bail!("SHUTDOWN_FORCE_EXIT_CODE must be nonzero");
        }
        if !matches!(self.logging.log_format.as_str(), "text" | "json") {
            tracing::warn!(format = %self.logging.log_format, "unknown LOG_FORMAT, falling back to text");
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool { self.app.env == "production" }
    /// Production always logs JSON.
    pub fn json_logs(&self) -> bool { self.is_production() || self.logging.log_format == "json" }
    pub fn grace_period(&self) -> Duration { Duration::from_secs(self.shutdown.grace_period_secs) }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            app: AppSection { env: "local".into(), name: "sigwatchd".into() },
            logging: LoggingSection { log_format: "text".into() },
            diagnostics: DiagnosticsSection { max_dump_bytes: DEFAULT_DUMP_BYTES, kernel_stacks: true },
            shutdown: ShutdownSection { grace_period_secs: 10, force_exit_code: 1 },
        }
    }

    #[test]
    fn defaults_validate() {
        let cfg = sample();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.grace_period(), Duration::from_secs(10));
        assert!(!cfg.is_production());
        assert!(!cfg.json_logs());
    }

    #[test]
    fn production_forces_json_logs() {
        let mut cfg = sample();
        cfg.app.env = "production".into();
        assert!(cfg.json_logs());
        let mut cfg = sample();
        cfg.logging.log_format = "json".into();
        assert!(cfg.json_logs());
    }

    #[test]
    fn rejects_tiny_dump_budget() {
        let mut cfg = sample();
        cfg.diagnostics.max_dump_bytes = 16;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_force_exit_code() {
        let mut cfg = sample();
        cfg.shutdown.force_exit_code = 0;
        assert!(cfg.validate().is_err());
    }
}
