//! Per-pair mover: provisioning, then a watch/transfer loop until shutdown.

use crate::error::MoverError;
use crate::provisioner::ensure_destination;
use crate::shutdown::ShutdownSignal;
use crate::transfer::transfer;
use crate::watcher::Watcher;
use chrono::Duration;
use queue_mover_runtime::{QueuePair, QueueProvider};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

// ============================================================================
// MOVER STATE
// ============================================================================

/// Lifecycle state of a mover, logged on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoverState {
    /// Waiting for the watcher to signal messages
    Idle,
    /// A transfer pass is running; the watcher is paused
    Transferring,
    /// Shutdown observed; finishing up
    ShuttingDown,
}

impl fmt::Display for MoverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoverState::Idle => write!(f, "idle"),
            MoverState::Transferring => write!(f, "transferring"),
            MoverState::ShuttingDown => write!(f, "shutting_down"),
        }
    }
}

// ============================================================================
// MOVER
// ============================================================================

/// Drives one source/destination queue pair
///
/// On `run` the mover first ensures the destination queue exists, then
/// spawns a [`Watcher`] on the source and alternates between waiting for
/// wake signals and draining the source in ten-message batches. Exactly one
/// of the watcher and the transfer loop touches the source at any time.
pub struct Mover {
    pair_id: String,
    pair: QueuePair,
    provider: Arc<dyn QueueProvider>,
    poll_wait: Option<Duration>,
}

impl Mover {
    pub fn new(pair_id: String, pair: QueuePair, provider: Arc<dyn QueueProvider>) -> Self {
        Self {
            pair_id,
            pair,
            provider,
            poll_wait: None,
        }
    }

    /// Override the watcher's long-poll wait bound
    pub fn with_poll_wait(mut self, poll_wait: Duration) -> Self {
        self.poll_wait = Some(poll_wait);
        self
    }

    fn transition(&self, from: MoverState, to: MoverState) {
        debug!(
            pair_id = %self.pair_id,
            from = %from,
            to = %to,
            "mover state transition"
        );
    }

    /// Run until shutdown or a fatal error
    ///
    /// The watcher task is joined on the clean shutdown path. On the fatal
    /// path it is left to observe the shared shutdown signal instead, so a
    /// watcher blocked in a long poll never delays error propagation.
    pub async fn run(self, mut shutdown: ShutdownSignal) -> Result<(), MoverError> {
        let attributes = ensure_destination(self.provider.as_ref(), &self.pair_id, &self.pair).await?;
        debug!(
            pair_id = %self.pair_id,
            visibility_timeout = attributes.visibility_timeout.as_deref().unwrap_or("-"),
            "destination ready"
        );

        // Capacity-one channels: the watcher blocks on resume after each
        // wake, so at most one wake is ever outstanding.
        let (wake_tx, mut wake_rx) = mpsc::channel::<()>(1);
        let (resume_tx, resume_rx) = mpsc::channel::<()>(1);

        let mut watcher = Watcher::new(
            Arc::clone(&self.provider),
            self.pair_id.clone(),
            self.pair.source.clone(),
        );
        if let Some(poll_wait) = self.poll_wait {
            watcher = watcher.with_poll_wait(poll_wait);
        }
        let watcher_shutdown = shutdown.clone();
        let watcher_task = tokio::spawn(watcher.run(wake_tx, resume_rx, watcher_shutdown));

        let mut state = MoverState::Idle;
        info!(pair_id = %self.pair_id, source = %self.pair.source, destination = %self.pair.destination, "mover started");

        let fatal = loop {
            tokio::select! {
                biased;
                _ = shutdown.signaled() => {
                    self.transition(state, MoverState::ShuttingDown);
                    break None;
                }
                woke = wake_rx.recv() => {
                    match woke {
                        Some(()) => {
                            self.transition(state, MoverState::Transferring);
                            state = MoverState::Transferring;

                            let outcome = transfer(&self.provider, &self.pair_id, &self.pair).await;

                            // Resume the watcher before inspecting the
                            // outcome; on the fatal path it exits via the
                            // shutdown signal anyway.
                            let _ = resume_tx.send(()).await;

                            match outcome {
                                Ok(outcome) => {
                                    if outcome.retained > 0 {
                                        warn!(
                                            pair_id = %self.pair_id,
                                            retained = outcome.retained,
                                            "messages retained on source after failed sends"
                                        );
                                    }
                                    debug!(
                                        pair_id = %self.pair_id,
                                        moved = outcome.moved,
                                        "transfer pass complete"
                                    );
                                    self.transition(state, MoverState::Idle);
                                    state = MoverState::Idle;
                                }
                                Err(err) => break Some(err),
                            }
                        }
                        None => {
                            // Watcher ended on its own; surface its error if any.
                            let joined = watcher_task.await;
                            return match joined {
                                Ok(Ok(())) => Ok(()),
                                Ok(Err(source)) => Err(MoverError::Watcher {
                                    pair_id: self.pair_id.clone(),
                                    source,
                                }),
                                Err(join) => Err(MoverError::TaskJoin {
                                    pair_id: self.pair_id.clone(),
                                    message: join.to_string(),
                                }),
                            };
                        }
                    }
                }
            }
        };

        match fatal {
            Some(err) => {
                // Detach the watcher; the supervisor raises shutdown on any
                // fatal, at which point it exits within one poll cycle.
                drop(wake_rx);
                Err(err)
            }
            None => {
                let joined = watcher_task.await;
                match joined {
                    Ok(Ok(())) => {
                        info!(pair_id = %self.pair_id, "mover stopped");
                        Ok(())
                    }
                    Ok(Err(source)) => Err(MoverError::Watcher {
                        pair_id: self.pair_id.clone(),
                        source,
                    }),
                    Err(join) => Err(MoverError::TaskJoin {
                        pair_id: self.pair_id.clone(),
                        message: join.to_string(),
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "mover_tests.rs"]
mod tests;
