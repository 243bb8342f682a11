use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to register handler for {signal}: {source}")]
    Register { signal: &'static str, #[source] source: io::Error },
    #[error("signal watcher already started in this process")] AlreadyStarted,
    #[error("signal watching is not supported on this platform")] Unsupported,
}

impl WatchError {
    pub fn register(signal: &'static str, source: io::Error) -> Self { WatchError::Register { signal, source } }
}

pub type WatchResult<T> = Result<T, WatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_error_names_the_signal() {
        let err = WatchError::register("SIGUSR1", io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(err.to_string(), "failed to register handler for SIGUSR1: denied");
        assert!(std::error::Error::source(&err).is_some());
    }
}
