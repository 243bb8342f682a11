use std::fmt;

/// OS signals the watcher cares about.
///
/// `Diagnostic` belongs to the dump loop; the other four request shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Diagnostic,
    Hangup,
    Interrupt,
    Terminate,
    Quit,
}

impl Signal {
    pub const DIAGNOSTIC: [Signal; 1] = [Signal::Diagnostic];
    pub const SHUTDOWN: [Signal; 4] = [Signal::Hangup, Signal::Interrupt, Signal::Terminate, Signal::Quit];

    pub fn name(self) -> &'static str {
        match self {
            Signal::Diagnostic => "SIGUSR1",
            Signal::Hangup => "SIGHUP",
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Quit => "SIGQUIT",
        }
    }

    pub fn is_shutdown(self) -> bool { !matches!(self, Signal::Diagnostic) }

    /// Only a quit-with-core request asks for a forced shutdown.
    pub fn is_force(self) -> bool { matches!(self, Signal::Quit) }

    #[cfg(unix)]
    pub fn kind(self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;
        match self {
            Signal::Diagnostic => SignalKind::user_defined1(),
            Signal::Hangup => SignalKind::hangup(),
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Quit => SignalKind::quit(),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_quit_forces() {
        let forced: Vec<_> = Signal::SHUTDOWN.iter().filter(|s| s.is_force()).collect();
        assert_eq!(forced, vec![&Signal::Quit]);
        assert!(!Signal::Diagnostic.is_force());
    }

    #[test]
    fn sets_are_disjoint() {
        assert!(Signal::SHUTDOWN.iter().all(|s| s.is_shutdown()));
        assert!(Signal::DIAGNOSTIC.iter().all(|s| !s.is_shutdown()));
    }

    #[test]
    fn displays_os_names() {
        assert_eq!(Signal::Interrupt.to_string(), "SIGINT");
        assert_eq!(Signal::Diagnostic.to_string(), "SIGUSR1");
    }
}
