//! Error kinds for the Squad RCON control-plane daemon.

use thiserror::Error;

/// Result type used throughout the workspace.
pub type Result<T> = std::result::Result<T, SquadError>;

/// The closed error taxonomy.
#[derive(Debug, Error)]
pub enum SquadError {
    /// Codec: frame size out of bounds or missing terminator.
    #[error("malformed RCON frame: {0}")]
    MalformedFrame(String),

    /// Session: authentication rejected. Semi-fatal — the supervisor keeps
    /// retrying at capped backoff but this should alert an operator.
    #[error("RCON authentication failed")]
    AuthFailed,

    /// Command: no response within the per-command timeout.
    #[error("RCON command timed out")]
    Timeout,

    /// Command queue: bound exceeded.
    #[error("RCON command queue is full")]
    QueueFull,

    /// Transport/session: the connection is down.
    #[error("RCON disconnected: {0}")]
    Disconnected(String),

    /// Shutdown: the operation was cancelled by `stop()`.
    #[error("cancelled")]
    Cancelled,

    /// Rule/response parser: local, never surfaced to callers.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Programming bug: logged with context, process continues.
    #[error("invariant violated: {0}")]
    InvariantViolated(String),

    /// I/O failure underneath the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SquadError {
    /// Whether this error should be reported to operators even though the
    /// process keeps running.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SquadError::AuthFailed)
    }
}
