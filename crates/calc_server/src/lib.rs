//! # Calc Server - Concurrent Line-Oriented Calculator Service
//!
//! A TCP server that gives many concurrent clients a shared, stateful
//! calculator. Each connection speaks a one-line-in, one-line-out protocol and
//! every client sees the same variable bindings.
//!
//! ## Architecture Overview
//!
//! * **Evaluator** ([`calc_eval::Evaluator`]) - the shared variable table and
//!   grammar, serializing assignments
//! * **Session** ([`connection::Session`]) - one task per client running the
//!   read → evaluate → respond loop
//! * **Admission Controller** ([`server::AdmissionController`]) - accepts
//!   connections and caps concurrent sessions with a counting semaphore
//! * **Lifecycle** ([`CalcServer`]) - binds, admits until shutdown, then
//!   drains every session before releasing the listener
//!
//! ## Wire Protocol
//!
//! | Request                          | Response                  |
//! |----------------------------------|---------------------------|
//! | `<int>` / bound `<identifier>`   | `<int>\n`                 |
//! | `<operand> <op> <operand>`       | `<int>\n` or `Error\n`    |
//! | `<identifier> = <expr>`          | `<int>\n` or `Error\n`    |
//! | `quit`                           | connection closes         |
//! | `shutdown`                       | connection closes, server drains |
//!
//! ## Shutdown
//!
//! The `shutdown` command (or [`CalcServer::shutdown`]) raises a write-once
//! flag. Admission stops, sessions already running continue until their
//! clients leave, and [`CalcServer::serve`] returns once the last one ends.

pub use config::ServerConfig;
pub use error::ServerError;
pub use server::CalcServer;
pub use shutdown::ShutdownSignal;

pub mod config;
pub mod connection;
pub mod error;
pub mod server;
pub mod shutdown;
