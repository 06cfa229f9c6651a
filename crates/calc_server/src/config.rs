//! Server configuration types and defaults.
//!
//! This module contains the server configuration structure and default values
//! used to initialize the calculator server.

use std::net::SocketAddr;
use std::time::Duration;

/// Default cap on simultaneously active sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 99_999;

/// Default upper bound on how long the admission loop waits before re-checking
/// the shutdown flag.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Default listen backlog passed to `listen(2)`.
pub const DEFAULT_BACKLOG: i32 = 1_024;

/// Default longest request line in bytes, terminator excluded.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1_024;

/// Configuration structure for the calculator server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub bind_address: SocketAddr,

    /// Maximum number of sessions that may be active at once. Connections
    /// beyond this wait to be admitted rather than being rejected.
    pub max_sessions: usize,

    /// Idle timeout per session in seconds; `0` disables it and lets a silent
    /// client hold its slot indefinitely
    pub connection_timeout: u64,

    /// Accept-wait bound in milliseconds
    pub poll_interval_ms: u64,

    /// Listen backlog for the bound socket
    pub backlog: i32,

    /// Longest request line a session buffers; longer lines are answered
    /// with `Error` and skipped
    pub max_line_length: usize,
}

impl ServerConfig {
    /// Creates a configuration bound to `bind_address` with all other
    /// settings at their defaults.
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            ..Default::default()
        }
    }

    /// The idle timeout as a `Duration`, or `None` when disabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.connection_timeout > 0).then(|| Duration::from_secs(self.connection_timeout))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 0)),
            max_sessions: DEFAULT_MAX_SESSIONS,
            connection_timeout: 0,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            backlog: DEFAULT_BACKLOG,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}
