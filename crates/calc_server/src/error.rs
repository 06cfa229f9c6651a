//! Error types for the server.
//!
//! Evaluation failures never show up here: they are answered with `Error` on
//! the originating connection. `ServerError` covers startup and the few
//! failures that stop the whole server.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Socket creation, bind or listen failures
    #[error("Network error: {0}")]
    Network(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings the server cannot run with
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invariant breakage inside the server, such as a closed slot pool
    #[error("Internal error: {0}")]
    Internal(String),
}
