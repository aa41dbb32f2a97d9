//! The provider trait implemented by specific queue backends.

use crate::error::QueueError;
use crate::message::{
    Message, MessageId, QueueAttributes, QueueUrl, ReceiptHandle, ReceiveOptions, ReceivedMessage,
};
use async_trait::async_trait;

/// Provider-imposed ceiling on messages per receive call
pub const MAX_RECEIVE_BATCH: u32 = 10;

/// Interface implemented by specific queue providers (AWS SQS, in-memory)
///
/// The five primitive remote operations against one named queue. A provider
/// instance is safe to share across pairs; every call names the queue it
/// targets by full URL.
#[async_trait]
pub trait QueueProvider: Send + Sync {
    /// Fetch the attributes of a queue
    ///
    /// Read-only and idempotent. An absent queue yields
    /// [`QueueError::QueueNotFound`], which callers treat as an expected
    /// condition rather than a failure.
    async fn describe_queue(&self, queue: &QueueUrl) -> Result<QueueAttributes, QueueError>;

    /// Create a queue with the given attribute template
    ///
    /// The provider does not guarantee idempotence; callers must only invoke
    /// this after confirming absence via [`describe_queue`].
    ///
    /// [`describe_queue`]: QueueProvider::describe_queue
    async fn create_queue(
        &self,
        queue: &QueueUrl,
        attributes: &QueueAttributes,
    ) -> Result<QueueUrl, QueueError>;

    /// Receive up to `options.max_messages` messages
    ///
    /// May return fewer than requested even when more exist; an empty result
    /// is not an error.
    async fn receive_messages(
        &self,
        queue: &QueueUrl,
        options: &ReceiveOptions,
    ) -> Result<Vec<ReceivedMessage>, QueueError>;

    /// Send a message; body and attributes round-trip byte-exact
    async fn send_message(
        &self,
        queue: &QueueUrl,
        message: &Message,
    ) -> Result<MessageId, QueueError>;

    /// Delete a previously received message by its receipt handle
    ///
    /// Handles are single-use and queue-scoped; an invalid or expired handle
    /// is an error, never silently ignored.
    async fn delete_message(
        &self,
        queue: &QueueUrl,
        receipt: &ReceiptHandle,
    ) -> Result<(), QueueError>;
}
