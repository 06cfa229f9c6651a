//! The server-wide shutdown flag.
//!
//! Any session may raise it with the `shutdown` command and the process may
//! raise it on SIGINT/SIGTERM. Once raised it stays raised; the admission loop
//! observes it and stops accepting.

use tokio::sync::watch;
use tracing::info;

/// Cloneable handle to the write-once shutdown flag.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: watch::Sender<bool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    /// Raises the flag. Calling it again has no further effect.
    pub fn trigger(&self) {
        let raised = self.sender.send_if_modified(|triggered| {
            if *triggered {
                false
            } else {
                *triggered = true;
                true
            }
        });

        if raised {
            info!("🛑 Shutdown requested, admission will stop");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once the flag has been raised, immediately if it already is.
    pub async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
