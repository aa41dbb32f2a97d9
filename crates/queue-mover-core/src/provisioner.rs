//! Destination queue provisioning.

use crate::error::MoverError;
use queue_mover_runtime::{QueueAttributes, QueueError, QueuePair, QueueProvider};
use tracing::{debug, info};

/// Ensure the pair's destination queue exists, creating it from the source's
/// attributes when absent
///
/// Idempotent with respect to an existing destination: a second run with the
/// same pair issues zero create calls. The attribute copy is one-shot - the
/// six recognized fields present on the source are mirrored verbatim at
/// creation, absent fields are omitted, and nothing is ever re-applied.
///
/// A source queue that does not exist is fatal; there is nothing to move.
pub async fn ensure_destination(
    provider: &dyn QueueProvider,
    pair_id: &str,
    pair: &QueuePair,
) -> Result<QueueAttributes, MoverError> {
    match provider.describe_queue(&pair.destination).await {
        Ok(attributes) => {
            debug!(
                pair_id,
                destination = %pair.destination,
                "destination queue exists"
            );
            Ok(attributes)
        }
        Err(err) if err.is_not_found() => {
            info!(
                pair_id,
                destination = %pair.destination,
                "destination queue absent, creating from source attributes"
            );

            let source_attributes =
                provider
                    .describe_queue(&pair.source)
                    .await
                    .map_err(|err| {
                        if err.is_not_found() {
                            MoverError::SourceQueueMissing {
                                pair_id: pair_id.to_string(),
                                queue: pair.source.as_str().to_string(),
                            }
                        } else {
                            MoverError::Provisioning {
                                pair_id: pair_id.to_string(),
                                source: err,
                            }
                        }
                    })?;

            provider
                .create_queue(&pair.destination, &source_attributes)
                .await
                .map_err(|err| MoverError::Provisioning {
                    pair_id: pair_id.to_string(),
                    source: err,
                })?;

            info!(pair_id, destination = %pair.destination, "destination queue created");
            Ok(source_attributes)
        }
        Err(err) => Err(MoverError::Provisioning {
            pair_id: pair_id.to_string(),
            source: err,
        }),
    }
}

#[cfg(test)]
#[path = "provisioner_tests.rs"]
mod tests;
