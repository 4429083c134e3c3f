//! Cooperative shutdown signal shared by every consumer's poll loop.
//!
//! Each binary spawns one task that races `SIGTERM` against `Ctrl+C` and
//! flips a shared flag; the poll loop checks the flag once per iteration and
//! winds down instead of polling again, so any message already dequeued from
//! the broker still gets written or quarantined before the process exits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A flag flipped once by the signal-waiting task and read by every poll
/// loop. Cloning shares the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    /// Create a fresh, unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Request shutdown. Idempotent.
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Spawn a task that waits for `SIGTERM` or `Ctrl+C` and sets the flag
    /// when either arrives.
    pub fn spawn_signal_listener(&self) -> tokio::task::JoinHandle<()> {
        let flag = self.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            flag.set();
        })
    }
}

/// Wait for `SIGTERM` (or `Ctrl+C` on non-Unix) and return.
pub async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(error) => {
                tracing::error!(%error, "failed to register SIGTERM handler");
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received Ctrl+C");
            }
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl+C");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unset() {
        let flag = ShutdownFlag::new();
        assert!(!flag.is_set());
    }

    #[test]
    fn set_is_idempotent() {
        let flag = ShutdownFlag::new();
        flag.set();
        flag.set();
        assert!(flag.is_set());
    }

    #[test]
    fn clones_share_the_same_flag() {
        let flag = ShutdownFlag::new();
        let clone = flag.clone();
        clone.set();
        assert!(flag.is_set());
    }
}
