//! Long-poll watcher: cheap presence checks on a source queue.

use crate::shutdown::ShutdownSignal;
use chrono::Duration;
use queue_mover_runtime::{QueueError, QueueProvider, QueueUrl, ReceiveOptions};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Default long-poll wait, the provider maximum
const DEFAULT_POLL_WAIT_SECONDS: i64 = 20;

/// Watcher for one pair's source queue
///
/// Loops until shutdown: a bounded blocking peek (one message, visibility
/// timeout zero) detects presence without consuming anything. When messages
/// are observed it sends `wake` and then blocks on `resume`, so it never
/// polls while the mover's transfer pass is outstanding. Shutdown is
/// observable in both waits.
pub struct Watcher {
    provider: Arc<dyn QueueProvider>,
    pair_id: String,
    source: QueueUrl,
    poll_wait: Duration,
}

impl Watcher {
    pub fn new(provider: Arc<dyn QueueProvider>, pair_id: String, source: QueueUrl) -> Self {
        Self {
            provider,
            pair_id,
            source,
            poll_wait: Duration::seconds(DEFAULT_POLL_WAIT_SECONDS),
        }
    }

    /// Override the long-poll wait bound (tests use short waits)
    pub fn with_poll_wait(mut self, poll_wait: Duration) -> Self {
        self.poll_wait = poll_wait;
        self
    }

    /// Run until shutdown or a fatal receive error
    pub async fn run(
        self,
        wake: mpsc::Sender<()>,
        mut resume: mpsc::Receiver<()>,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), QueueError> {
        let options = ReceiveOptions::new()
            .with_max_messages(1)
            .with_wait_time(self.poll_wait)
            .with_visibility_timeout(Duration::zero());

        loop {
            // The peek is read-only and non-consuming, so cancelling it on
            // shutdown abandons nothing; consuming calls are never raced
            // against shutdown.
            let observed = tokio::select! {
                biased;
                _ = shutdown.signaled() => {
                    debug!(pair_id = %self.pair_id, "watcher observed shutdown");
                    return Ok(());
                }
                observed = self.provider.receive_messages(&self.source, &options) => observed?,
            };

            if observed.is_empty() {
                continue;
            }

            debug!(pair_id = %self.pair_id, "messages observed on source");

            if wake.send(()).await.is_err() {
                // mover is gone; nothing left to wake
                return Ok(());
            }

            tokio::select! {
                biased;
                _ = shutdown.signaled() => {
                    debug!(pair_id = %self.pair_id, "watcher observed shutdown while awaiting resume");
                    return Ok(());
                }
                accepted = resume.recv() => {
                    if accepted.is_none() {
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
