//! Cooperative shutdown signaling.
//!
//! One broadcast for the whole process. Tasks observe the signal via a
//! non-blocking check ahead of their next action or by awaiting it inside a
//! `select!`; no task or in-flight remote call is ever forcibly aborted.

use std::sync::Arc;
use tokio::sync::watch;

/// Sender side of the process-wide shutdown broadcast
///
/// Cloneable so both the OS-signal task and the supervisor (which stops the
/// remaining movers when one fails fatally) can trigger it.
#[derive(Clone)]
pub struct ShutdownController {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Broadcast shutdown; idempotent
    pub fn signal(&self) {
        let _ = self.tx.send(true);
    }

    /// Create a receiver observing this controller
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver side of the shutdown broadcast
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Non-blocking check
    pub fn is_signaled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been signaled
    ///
    /// A dropped controller counts as shutdown: there is no longer anything
    /// that could keep the process alive on purpose.
    pub async fn signaled(&mut self) {
        let _ = self.rx.wait_for(|signaled| *signaled).await;
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
