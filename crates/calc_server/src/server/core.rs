//! Core calculator server implementation.
//!
//! `CalcServer` owns the shared evaluator, the shutdown flag and the session
//! counters, and sequences the server's life: bind, admit until shutdown,
//! drain every session, release the listener.

use super::admission::AdmissionController;
use super::listener::bind_listener;
use super::stats::SessionStats;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::shutdown::ShutdownSignal;
use calc_eval::Evaluator;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// The calculator server.
///
/// # Lifecycle
///
/// 1. [`CalcServer::new`] creates an empty variable table
/// 2. [`CalcServer::bind`] opens the listening socket
/// 3. [`CalcServer::serve`] admits sessions until a client sends `shutdown`
///    or [`CalcServer::shutdown`] is called
/// 4. `serve` then waits for every in-flight session before returning and
///    dropping the listener
///
/// # Example
///
/// ```no_run
/// use calc_server::{CalcServer, ServerConfig};
///
/// # async fn example() -> Result<(), calc_server::ServerError> {
/// let server = CalcServer::new(ServerConfig::new("127.0.0.1:7000".parse().unwrap()));
/// let listener = server.bind()?;
/// server.serve(listener).await
/// # }
/// ```
pub struct CalcServer {
    config: ServerConfig,
    evaluator: Arc<Evaluator>,
    shutdown: ShutdownSignal,
    stats: Arc<SessionStats>,
}

impl CalcServer {
    /// Creates a server with an empty variable table and a lowered shutdown flag.
    ///
    /// Nothing is bound until [`CalcServer::bind`] or [`CalcServer::run`].
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            evaluator: Arc::new(Evaluator::new()),
            shutdown: ShutdownSignal::new(),
            stats: Arc::new(SessionStats::new()),
        }
    }

    /// Opens the listening socket described by the configuration.
    pub fn bind(&self) -> Result<TcpListener, ServerError> {
        bind_listener(&self.config)
    }

    /// Binds, then serves until shutdown and drain complete.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = self.bind()?;
        self.serve(listener).await
    }

    /// Serves on an already-bound listener until shutdown and drain complete.
    ///
    /// # Arguments
    ///
    /// * `listener` - A listener from [`CalcServer::bind`]; it is dropped once
    ///   the last session has ended
    ///
    /// # Returns
    ///
    /// `Ok(())` after a clean drain. An admission failure is still followed by
    /// a full drain before it is returned.
    ///
    /// # Errors
    ///
    /// [`ServerError::Config`] if `max_sessions` cannot size the slot pool.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let mut admission = AdmissionController::new(
            &self.config,
            self.evaluator.clone(),
            self.shutdown.clone(),
            self.stats.clone(),
        )?;

        info!(
            "🚀 Calculator server accepting on {} (max sessions: {})",
            listener.local_addr()?,
            self.config.max_sessions
        );

        let admitted = admission.run(&listener).await;
        if let Err(e) = &admitted {
            error!("Admission loop failed: {}", e);
        }

        info!("⏳ Draining {} active session(s)", self.stats.active());
        admission.drain().await?;
        drop(listener);

        info!(
            "✅ Server stopped after {} session(s), peak concurrency {}",
            self.stats.total(),
            self.stats.peak()
        );
        admitted
    }

    /// Raises the shutdown flag, as the `shutdown` command does.
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Returns a handle to the shutdown flag.
    ///
    /// Raising the flag through the handle is equivalent to calling
    /// [`CalcServer::shutdown`]; this is how the binary wires termination
    /// signals to the server.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// The variable table shared by every session.
    pub fn evaluator(&self) -> Arc<Evaluator> {
        self.evaluator.clone()
    }

    /// Live session counters.
    ///
    /// # Returns
    ///
    /// A shared handle; its values keep updating as sessions come and go.
    pub fn stats(&self) -> Arc<SessionStats> {
        self.stats.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    fn test_server() -> CalcServer {
        CalcServer::new(ServerConfig::new("127.0.0.1:0".parse().unwrap()))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_new_server_is_idle() {
        let server = test_server();
        assert!(server.evaluator().is_empty());
        assert_eq!(server.stats().active(), 0);
        assert!(!server.shutdown_signal().is_triggered());
        assert_eq!(server.config().max_sessions, 99_999);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_programmatic_shutdown_stops_serve() {
        let server = Arc::new(test_server());
        let listener = server.bind().expect("bind");

        let serving = {
            let server = server.clone();
            tokio::spawn(async move { server.serve(listener).await })
        };

        server.shutdown();
        timeout(Duration::from_secs(2), serving)
            .await
            .expect("serve should return after shutdown")
            .expect("serve task panicked")
            .expect("serve should succeed");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_zero_capacity_is_rejected() {
        let server = CalcServer::new(ServerConfig {
            max_sessions: 0,
            ..ServerConfig::new("127.0.0.1:0".parse().unwrap())
        });
        let listener = server.bind().expect("bind");
        assert!(matches!(server.serve(listener).await, Err(ServerError::Config(_))));
    }
}
