//! Process termination signals wired to the server's shutdown flag.
//!
//! SIGINT and SIGTERM (Ctrl+C on Windows) raise the same flag as the
//! `shutdown` command, so sessions in flight still finish before exit.

use calc_server::ShutdownSignal;
use std::io;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Registered termination signal streams.
///
/// Registration happens up front so a failure is reported before the server
/// starts rather than from inside a background task.
pub struct TerminationSignals {
    #[cfg(unix)]
    interrupt: Signal,
    #[cfg(unix)]
    terminate: Signal,
    #[cfg(windows)]
    ctrl_c: tokio::signal::windows::CtrlC,
}

impl TerminationSignals {
    pub fn register() -> io::Result<Self> {
        #[cfg(unix)]
        {
            Ok(Self {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
            })
        }

        #[cfg(windows)]
        {
            Ok(Self {
                ctrl_c: tokio::signal::windows::ctrl_c()?,
            })
        }
    }

    /// Waits for the next termination signal and returns its name.
    pub async fn recv(&mut self) -> &'static str {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = self.interrupt.recv() => "SIGINT",
                _ = self.terminate.recv() => "SIGTERM",
            }
        }

        #[cfg(windows)]
        {
            self.ctrl_c.recv().await;
            "Ctrl+C"
        }
    }
}

/// Spawns a task that raises `shutdown` on the first termination signal.
///
/// The task also exits, without doing anything, once `shutdown` is raised by
/// other means.
///
/// # Errors
///
/// Returns an error if the signal handlers cannot be registered.
pub fn install(shutdown: ShutdownSignal) -> io::Result<JoinHandle<()>> {
    let mut signals = TerminationSignals::register()?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            name = signals.recv() => {
                info!("📡 Received {}, shutting down", name);
                shutdown.trigger();
            }
            _ = shutdown.wait() => {
                debug!("Shutdown already requested, signal watcher exiting");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_recv_pends_without_signal() {
        let mut signals = TerminationSignals::register().unwrap();
        let result = timeout(Duration::from_millis(10), signals.recv()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_watcher_leaves_flag_alone_until_signalled() {
        let shutdown = ShutdownSignal::new();
        let watcher = install(shutdown.clone()).unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!shutdown.is_triggered());
        assert!(!watcher.is_finished());

        shutdown.trigger();
        timeout(Duration::from_secs(1), watcher)
            .await
            .expect("watcher should exit once shutdown is raised")
            .expect("watcher task panicked");
    }
}
