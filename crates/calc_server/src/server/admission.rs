//! Connection admission and concurrency bounding.
//!
//! The admission loop accepts connections, takes one slot from a counting
//! semaphore per connection, and hands the connection to its own session task.
//! When every slot is held the loop itself waits for one to free up, so extra
//! clients queue in the listen backlog instead of being turned away.

use super::stats::SessionStats;
use crate::config::ServerConfig;
use crate::connection::{Session, SessionEnd};
use crate::error::ServerError;
use crate::shutdown::ShutdownSignal;
use calc_eval::Evaluator;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// Pause after a failed `accept` so a persistent error (e.g. EMFILE) does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// One held admission slot.
///
/// Dropping it returns the slot and updates the stats, whichever way the
/// owning session task ends.
struct SlotGuard {
    _permit: OwnedSemaphorePermit,
    stats: Arc<SessionStats>,
}

impl SlotGuard {
    fn new(permit: OwnedSemaphorePermit, stats: Arc<SessionStats>) -> Self {
        stats.session_started();
        Self {
            _permit: permit,
            stats,
        }
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.stats.session_finished();
    }
}

/// The server's accept-and-dispatch loop.
pub struct AdmissionController {
    slots: Arc<Semaphore>,
    capacity: u32,
    evaluator: Arc<Evaluator>,
    shutdown: ShutdownSignal,
    stats: Arc<SessionStats>,
    idle_timeout: Option<Duration>,
    poll_interval: Duration,
    max_line_length: usize,
    sessions: JoinSet<()>,
}

impl AdmissionController {
    /// Creates a controller with `config.max_sessions` slots.
    ///
    /// # Arguments
    ///
    /// * `config` - Capacity, idle timeout, poll interval and line limit
    /// * `evaluator` - Handed to every admitted session
    /// * `shutdown` - Observed before every accept, and raised by sessions
    /// * `stats` - Updated as slots are taken and returned
    ///
    /// # Errors
    ///
    /// [`ServerError::Config`] if the capacity is zero or too large for the
    /// slot pool.
    pub fn new(
        config: &ServerConfig,
        evaluator: Arc<Evaluator>,
        shutdown: ShutdownSignal,
        stats: Arc<SessionStats>,
    ) -> Result<Self, ServerError> {
        let capacity = u32::try_from(config.max_sessions)
            .ok()
            .filter(|&n| n > 0 && (n as usize) <= Semaphore::MAX_PERMITS)
            .ok_or_else(|| {
                ServerError::Config(format!(
                    "max_sessions must be between 1 and {}, got {}",
                    u32::MAX,
                    config.max_sessions
                ))
            })?;

        Ok(Self {
            slots: Arc::new(Semaphore::new(capacity as usize)),
            capacity,
            evaluator,
            shutdown,
            stats,
            idle_timeout: config.idle_timeout(),
            poll_interval: config.poll_interval(),
            max_line_length: config.max_line_length,
            sessions: JoinSet::new(),
        })
    }

    /// Slots not currently held by a session.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Accepts and dispatches connections until the shutdown flag is raised.
    ///
    /// The flag is checked before every accept; a slot acquisition already in
    /// progress when it is raised still completes and its session runs.
    pub async fn run(&mut self, listener: &TcpListener) -> Result<(), ServerError> {
        loop {
            self.reap_finished();

            if self.shutdown.is_triggered() {
                break;
            }

            let accepted = tokio::select! {
                biased;
                _ = self.shutdown.wait() => break,
                result = listener.accept() => result,
                _ = tokio::time::sleep(self.poll_interval) => continue,
            };

            let (stream, peer) = match accepted {
                Ok(connection) => connection,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };

            if let Err(e) = stream.set_nodelay(true) {
                debug!("Failed to set TCP_NODELAY for {}: {}", peer, e);
            }

            if self.slots.available_permits() == 0 {
                info!("⏳ All {} session slots in use, {} waits for admission", self.capacity, peer);
            }
            let permit = self
                .slots
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| ServerError::Internal("session slot pool closed".to_string()))?;
            let guard = SlotGuard::new(permit, self.stats.clone());

            let session = Session::new(peer, self.evaluator.clone(), self.shutdown.clone())
                .with_idle_timeout(self.idle_timeout)
                .with_max_line_length(self.max_line_length);
            info!(
                "🔗 Session {} admitted from {} (active: {})",
                session.id,
                peer,
                self.stats.active()
            );

            self.sessions.spawn(async move {
                let _guard = guard;
                let id = session.id;
                let end = session.run(stream).await;
                match &end {
                    SessionEnd::IoError(e) => warn!("Session {} from {} failed: {}", id, peer, e),
                    other => info!("👋 Session {} from {} ended: {}", id, peer, other),
                }
            });
        }

        info!("🛑 Admission stopped, no further connections will be accepted");
        Ok(())
    }

    /// Waits for every admitted session to finish and release its slot.
    ///
    /// Consumes the controller; the slot pool is closed on return, so no
    /// session can be admitted afterwards.
    pub async fn drain(mut self) -> Result<(), ServerError> {
        if !self.sessions.is_empty() {
            info!("⏳ Waiting for {} session(s) to finish", self.sessions.len());
        }

        while let Some(result) = self.sessions.join_next().await {
            log_join_failure(result);
        }

        // Every slot back in the pool proves no session is still running.
        let all_slots = self
            .slots
            .acquire_many(self.capacity)
            .await
            .map_err(|_| ServerError::Internal("session slot pool closed".to_string()))?;
        drop(all_slots);
        self.slots.close();

        info!("✅ All sessions drained");
        Ok(())
    }

    fn reap_finished(&mut self) {
        while let Some(result) = self.sessions.try_join_next() {
            log_join_failure(result);
        }
    }
}

fn log_join_failure(result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!("Session task failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(max_sessions: usize) -> Result<AdmissionController, ServerError> {
        let config = ServerConfig {
            max_sessions,
            ..ServerConfig::new("127.0.0.1:0".parse().unwrap())
        };
        AdmissionController::new(
            &config,
            Arc::new(Evaluator::new()),
            ShutdownSignal::new(),
            Arc::new(SessionStats::new()),
        )
    }

    #[tokio::test]
    async fn test_capacity_validation() {
        assert!(matches!(controller(0), Err(ServerError::Config(_))));
        let controller = controller(3).expect("valid capacity");
        assert_eq!(controller.available_slots(), 3);
    }

    #[tokio::test]
    async fn test_slot_guard_releases_on_drop() {
        let stats = Arc::new(SessionStats::new());
        let slots = Arc::new(Semaphore::new(1));

        let guard = SlotGuard::new(slots.clone().acquire_owned().await.unwrap(), stats.clone());
        assert_eq!(slots.available_permits(), 0);
        assert_eq!(stats.active(), 1);

        drop(guard);
        assert_eq!(slots.available_permits(), 1);
        assert_eq!(stats.active(), 0);
    }

    #[tokio::test]
    async fn test_run_returns_when_already_shut_down() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut controller = controller(2).unwrap();
        controller.shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), controller.run(&listener))
            .await
            .expect("run should not block once shut down")
            .expect("run should succeed");
        controller.drain().await.expect("drain with no sessions");
    }
}
