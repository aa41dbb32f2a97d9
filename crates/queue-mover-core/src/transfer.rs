//! One batch transfer pass: drain up to one receive batch from the source
//! and move each message to the destination concurrently.

use crate::error::MoverError;
use chrono::Duration;
use queue_mover_runtime::{
    QueuePair, QueueProvider, ReceiveOptions, ReceivedMessage, MAX_RECEIVE_BATCH,
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Counts for one completed transfer pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferOutcome {
    /// Messages written to the destination and deleted from the source
    pub moved: usize,
    /// Messages left on the source after a failed send; they become visible
    /// again once their visibility timeout elapses
    pub retained: usize,
}

/// Per-message result inside a pass
enum MoveResult {
    Moved,
    Retained,
}

/// Run one transfer pass for a queue pair
///
/// Receives up to the provider batch ceiling, then moves every received
/// message concurrently: send a byte-exact copy to the destination, and only
/// after the send succeeds delete the original from the source by its
/// receipt handle. The pass joins all per-message tasks before returning,
/// whatever their outcomes.
///
/// A failed send retains the message on the source and is not fatal. A failed
/// delete after a successful send is fatal: the source now holds a confirmed
/// duplicate, and continuing would mask the inconsistency. Even then the join
/// barrier holds - sibling in-flight messages are never abandoned mid-move.
pub async fn transfer(
    provider: &Arc<dyn QueueProvider>,
    pair_id: &str,
    pair: &QueuePair,
) -> Result<TransferOutcome, MoverError> {
    let options = ReceiveOptions::new()
        .with_max_messages(MAX_RECEIVE_BATCH)
        .with_wait_time(Duration::zero());

    let messages = provider
        .receive_messages(&pair.source, &options)
        .await
        .map_err(|err| MoverError::Receive {
            pair_id: pair_id.to_string(),
            source: err,
        })?;

    if messages.is_empty() {
        debug!(pair_id, "nothing in the queue");
        return Ok(TransferOutcome::default());
    }

    info!(pair_id, count = messages.len(), "operating on batch");

    let mut tasks = JoinSet::new();
    for message in messages {
        let provider = Arc::clone(provider);
        let pair = pair.clone();
        let pair_id = pair_id.to_string();
        tasks.spawn(async move { move_one(provider, pair_id, pair, message).await });
    }

    // Join barrier: collect every per-message outcome before surfacing a
    // fatal error, so no sibling task is left mid-move.
    let mut outcome = TransferOutcome::default();
    let mut fatal: Option<MoverError> = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(MoveResult::Moved)) => outcome.moved += 1,
            Ok(Ok(MoveResult::Retained)) => outcome.retained += 1,
            Ok(Err(err)) => {
                fatal.get_or_insert(err);
            }
            Err(join_err) => {
                fatal.get_or_insert(MoverError::TaskJoin {
                    pair_id: pair_id.to_string(),
                    message: join_err.to_string(),
                });
            }
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(outcome),
    }
}

/// Move a single message: send the copy, then delete the original
async fn move_one(
    provider: Arc<dyn QueueProvider>,
    pair_id: String,
    pair: QueuePair,
    received: ReceivedMessage,
) -> Result<MoveResult, MoverError> {
    let copy = received.message();

    if let Err(err) = provider.send_message(&pair.destination, &copy).await {
        warn!(
            pair_id,
            message_id = %received.message_id,
            error = %err,
            "send to destination failed, message retained on source"
        );
        return Ok(MoveResult::Retained);
    }

    provider
        .delete_message(&pair.source, &received.receipt_handle)
        .await
        .map_err(|err| MoverError::DeleteFailed {
            pair_id: pair_id.clone(),
            source: err,
        })?;

    Ok(MoveResult::Moved)
}

#[cfg(test)]
#[path = "transfer_tests.rs"]
mod tests;
