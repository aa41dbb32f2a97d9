//! Supervisor: one mover per configured queue pair, fail-fast as a group.

use crate::error::MoverError;
use crate::mover::Mover;
use crate::shutdown::ShutdownController;
use chrono::Duration;
use queue_mover_runtime::{QueuePair, QueueProvider};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Runs all configured movers and enforces the fail-fast group policy
///
/// Movers are independent while healthy. The first fatal error from any of
/// them raises the shared shutdown signal, the remaining movers drain their
/// in-flight transfer passes, and `run` returns that first error.
pub struct Supervisor {
    poll_wait: Option<Duration>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self { poll_wait: None }
    }

    /// Override the long-poll wait bound for all movers
    pub fn with_poll_wait(mut self, poll_wait: Duration) -> Self {
        self.poll_wait = Some(poll_wait);
        self
    }

    /// Run every pair to completion
    ///
    /// Returns `Ok(())` when all movers stop cleanly after shutdown, or the
    /// first fatal [`MoverError`] otherwise. Pair identifiers are assigned
    /// positionally as `queue-1`, `queue-2`, ...
    pub async fn run(
        self,
        pairs: Vec<(QueuePair, Arc<dyn QueueProvider>)>,
        controller: ShutdownController,
    ) -> Result<(), MoverError> {
        let mut movers = JoinSet::new();
        for (index, (pair, provider)) in pairs.into_iter().enumerate() {
            let pair_id = format!("queue-{}", index + 1);
            let mut mover = Mover::new(pair_id, pair, provider);
            if let Some(poll_wait) = self.poll_wait {
                mover = mover.with_poll_wait(poll_wait);
            }
            movers.spawn(mover.run(controller.subscribe()));
        }

        info!(movers = movers.len(), "supervisor started");

        let mut first_error: Option<MoverError> = None;
        while let Some(joined) = movers.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    if first_error.is_none() {
                        error!(
                            pair_id = err.pair_id(),
                            error = %err,
                            "mover failed; stopping all movers"
                        );
                        controller.signal();
                        first_error = Some(err);
                    }
                }
                Err(join) => {
                    if first_error.is_none() {
                        error!(error = %join, "mover task panicked; stopping all movers");
                        controller.signal();
                        first_error = Some(MoverError::TaskJoin {
                            pair_id: String::from("unknown"),
                            message: join.to_string(),
                        });
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => {
                info!("supervisor stopped");
                Ok(())
            }
        }
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
