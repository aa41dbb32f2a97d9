//! Error types for the mover core.

use queue_mover_runtime::QueueError;
use thiserror::Error;

/// Fatal conditions that end a mover
///
/// Per-message send failures are not represented here; they are logged and
/// the message is retained on the source for a future pass. Everything in
/// this enum terminates the owning mover, and - by supervisor policy - the
/// whole run.
#[derive(Debug, Error)]
pub enum MoverError {
    #[error("{pair_id}: source queue does not exist: {queue}")]
    SourceQueueMissing { pair_id: String, queue: String },

    #[error("{pair_id}: failed to provision destination queue")]
    Provisioning {
        pair_id: String,
        #[source]
        source: QueueError,
    },

    #[error("{pair_id}: failed to receive from source queue")]
    Receive {
        pair_id: String,
        #[source]
        source: QueueError,
    },

    #[error(
        "{pair_id}: message copied to destination but delete from source failed; \
         the source now holds a confirmed duplicate"
    )]
    DeleteFailed {
        pair_id: String,
        #[source]
        source: QueueError,
    },

    #[error("{pair_id}: watcher failed")]
    Watcher {
        pair_id: String,
        #[source]
        source: QueueError,
    },

    #[error("{pair_id}: task panicked or was cancelled: {message}")]
    TaskJoin { pair_id: String, message: String },
}

impl MoverError {
    /// The identifier of the pair whose mover failed
    pub fn pair_id(&self) -> &str {
        match self {
            Self::SourceQueueMissing { pair_id, .. } => pair_id,
            Self::Provisioning { pair_id, .. } => pair_id,
            Self::Receive { pair_id, .. } => pair_id,
            Self::DeleteFailed { pair_id, .. } => pair_id,
            Self::Watcher { pair_id, .. } => pair_id,
            Self::TaskJoin { pair_id, .. } => pair_id,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
