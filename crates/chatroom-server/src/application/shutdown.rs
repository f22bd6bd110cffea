//! Process-wide shutdown signal.
//!
//! One [`ShutdownTrigger`] is held by whoever decides the process should stop
//! (Ctrl+C in `main.rs`, or the test harness).  Every long-running loop holds a
//! cloned [`ShutdownSignal`] and selects on [`ShutdownSignal::wait`].
//!
//! Dropping the trigger counts as triggering it, so a forgotten trigger can
//! never leave tasks waiting forever.

use tokio::sync::watch;

/// Creates a connected trigger/signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

/// The sending side of the shutdown channel.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Signals every [`ShutdownSignal`] to stop.  Calling it again is a no-op.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// The receiving side of the shutdown channel.  Cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolves once shutdown has been triggered or the trigger was dropped.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        // An error means the trigger is gone, which also means shutdown.
        let _ = rx.wait_for(|triggered| *triggered).await;
    }

    /// Returns `true` if shutdown has already been triggered.
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
