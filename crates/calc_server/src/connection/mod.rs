//! Client session handling.
//!
//! This module drives individual client connections: parsing the line
//! protocol, dispatching to the evaluator, and reporting how each session
//! ended.

pub mod protocol;
pub mod session;

pub use protocol::{Request, Response};
pub use session::Session;

use std::fmt;
use uuid::Uuid;

/// Identifier attached to a session's log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal state of a session.
#[derive(Debug)]
pub enum SessionEnd {
    /// The client closed its side of the connection.
    ClientClosed,
    /// The client sent `quit`.
    Quit,
    /// The client sent `shutdown`.
    Shutdown,
    /// No line arrived within the configured idle timeout.
    IdleTimeout,
    /// Reading or writing the socket failed.
    IoError(std::io::Error),
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEnd::ClientClosed => f.write_str("closed by client"),
            SessionEnd::Quit => f.write_str("quit"),
            SessionEnd::Shutdown => f.write_str("shutdown"),
            SessionEnd::IdleTimeout => f.write_str("idle timeout"),
            SessionEnd::IoError(e) => write!(f, "I/O error: {e}"),
        }
    }
}
