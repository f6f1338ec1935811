use std::io;
use thiserror::Error;

/// Result type used throughout the uplink library
pub type Result<T, E = ReporterError> = std::result::Result<T, E>;

/// Custom Error type for the uplink library
#[derive(Error, Debug)]
pub enum ReporterError {
    /// Fatal misconfiguration detected while building the collector channel.
    /// Never retried; the reporter must not be used after seeing this.
    #[error("setup error: {0}")]
    Setup(String),

    /// Connection-level stream failure. Contained by the reporter and
    /// answered with a delayed reconnect.
    #[error("transport error: {0}")]
    Transport(String),

    /// The collector rejected a report at the application level. Retrying
    /// would repeat the rejection, so no reconnect is scheduled.
    #[error("collector rejected report: {0}")]
    Rejected(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Misuse of the reporter lifecycle (e.g. start after shutdown).
    #[error("lifecycle error: {0}")]
    Lifecycle(String),
}

impl ReporterError {
    /// Whether this error should trigger the delayed-reconnect policy.
    pub fn is_transport(&self) -> bool {
        matches!(self, ReporterError::Transport(_))
    }

    /// Whether this error is fatal and must not be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReporterError::Setup(_) | ReporterError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_retryable() {
        assert!(ReporterError::Transport("connection reset".into()).is_transport());
        assert!(!ReporterError::Rejected("bad report".into()).is_transport());
        assert!(!ReporterError::Setup("bad cert".into()).is_transport());
    }

    #[test]
    fn setup_errors_are_fatal() {
        assert!(ReporterError::Setup("bad cert".into()).is_fatal());
        assert!(!ReporterError::Transport("timeout".into()).is_fatal());
    }
}
