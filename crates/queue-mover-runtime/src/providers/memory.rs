//! In-memory queue provider implementation for testing and development.
//!
//! A fully functional in-memory queue that:
//! - Tracks queue attributes, visible messages, and in-flight messages
//! - Implements visibility timeouts with automatic re-queue on expiry
//! - Supports non-consuming peeks (visibility timeout of zero)
//! - Records an operation trace for call-order assertions in tests
//! - Injects send/delete failures per queue
//!
//! This provider is intended for unit and integration testing of core mover
//! logic; production deployments use [`super::AwsSqsProvider`].

use crate::client::{QueueProvider, MAX_RECEIVE_BATCH};
use crate::error::QueueError;
use crate::message::{
    Message, MessageId, QueueAttributes, QueueUrl, ReceiptHandle, ReceiveOptions, ReceivedMessage,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

// ============================================================================
// Configuration
// ============================================================================

/// In-memory provider configuration
#[derive(Debug, Clone)]
pub struct InMemoryConfig {
    /// Visibility timeout applied when neither the receive call nor the
    /// queue attributes specify one
    pub default_visibility_timeout: Duration,
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            default_visibility_timeout: Duration::seconds(30),
        }
    }
}

// ============================================================================
// Operation Trace
// ============================================================================

/// One recorded provider call, in issue order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    pub queue: String,
}

/// The kind of provider call recorded in the trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationKind {
    Describe,
    Create,
    Receive { consuming: bool },
    Send { body: String },
    Delete { receipt: String },
}

// ============================================================================
// Internal Storage Structures
// ============================================================================

/// Thread-safe storage for all queues
struct QueueStorage {
    queues: HashMap<String, InMemoryQueue>,
    operations: Vec<Operation>,
    config: InMemoryConfig,
}

impl QueueStorage {
    fn new(config: InMemoryConfig) -> Self {
        Self {
            queues: HashMap::new(),
            operations: Vec::new(),
            config,
        }
    }

    fn record(&mut self, queue: &QueueUrl, kind: OperationKind) {
        self.operations.push(Operation {
            kind,
            queue: queue.as_str().to_string(),
        });
    }

    fn queue_mut(&mut self, queue: &QueueUrl) -> Result<&mut InMemoryQueue, QueueError> {
        self.queues
            .get_mut(queue.as_str())
            .ok_or_else(|| QueueError::QueueNotFound {
                queue: queue.as_str().to_string(),
            })
    }
}

/// Internal state for a single queue
struct InMemoryQueue {
    attributes: QueueAttributes,
    /// Messages available to receivers, in arrival order
    visible: VecDeque<StoredMessage>,
    /// Messages locked by a consuming receive, keyed by receipt handle
    in_flight: HashMap<String, InFlightMessage>,
    fail_sends: bool,
    fail_deletes: bool,
}

impl InMemoryQueue {
    fn new(attributes: QueueAttributes) -> Self {
        Self {
            attributes,
            visible: VecDeque::new(),
            in_flight: HashMap::new(),
            fail_sends: false,
            fail_deletes: false,
        }
    }

    /// Visibility window for a consuming receive on this queue
    fn visibility_timeout(&self, options: &ReceiveOptions, config: &InMemoryConfig) -> Duration {
        options
            .visibility_timeout
            .or_else(|| {
                self.attributes
                    .visibility_timeout
                    .as_ref()
                    .and_then(|v| v.parse::<i64>().ok())
                    .map(Duration::seconds)
            })
            .unwrap_or(config.default_visibility_timeout)
    }

    /// Return expired in-flight messages to the front of the visible set
    fn reclaim_expired(&mut self, now: DateTime<Utc>) {
        let expired: Vec<String> = self
            .in_flight
            .iter()
            .filter(|(_, m)| m.visible_again_at <= now)
            .map(|(handle, _)| handle.clone())
            .collect();

        for handle in expired {
            if let Some(in_flight) = self.in_flight.remove(&handle) {
                self.visible.push_front(in_flight.message);
            }
        }
    }
}

/// A message at rest in a queue
#[derive(Clone)]
struct StoredMessage {
    message_id: MessageId,
    message: Message,
}

impl StoredMessage {
    fn to_received(&self, receipt_handle: ReceiptHandle) -> ReceivedMessage {
        ReceivedMessage {
            message_id: self.message_id.clone(),
            body: self.message.body.clone(),
            attributes: self.message.attributes.clone(),
            receipt_handle,
        }
    }
}

/// A message locked by a consuming receive
struct InFlightMessage {
    message: StoredMessage,
    visible_again_at: DateTime<Utc>,
}

// ============================================================================
// InMemoryProvider
// ============================================================================

/// In-memory queue provider
pub struct InMemoryProvider {
    storage: Arc<Mutex<QueueStorage>>,
}

impl InMemoryProvider {
    /// Create new in-memory provider with configuration
    pub fn new(config: InMemoryConfig) -> Self {
        Self {
            storage: Arc::new(Mutex::new(QueueStorage::new(config))),
        }
    }

    /// Register a queue with the given attributes, without recording a trace entry
    pub fn register_queue(&self, queue: &QueueUrl, attributes: QueueAttributes) {
        let mut storage = self.lock();
        storage
            .queues
            .insert(queue.as_str().to_string(), InMemoryQueue::new(attributes));
    }

    /// Seed messages onto a queue, without recording trace entries
    pub fn seed_messages(&self, queue: &QueueUrl, messages: Vec<Message>) {
        let mut storage = self.lock();
        let entry = storage
            .queues
            .get_mut(queue.as_str())
            .unwrap_or_else(|| panic!("queue not registered: {}", queue));
        for message in messages {
            entry.visible.push_back(StoredMessage {
                message_id: MessageId::new(uuid::Uuid::new_v4().to_string()),
                message,
            });
        }
    }

    /// Make every send to the given queue fail until cleared
    pub fn fail_sends(&self, queue: &QueueUrl, enabled: bool) {
        if let Some(entry) = self.lock().queues.get_mut(queue.as_str()) {
            entry.fail_sends = enabled;
        }
    }

    /// Make every delete on the given queue fail until cleared
    pub fn fail_deletes(&self, queue: &QueueUrl, enabled: bool) {
        if let Some(entry) = self.lock().queues.get_mut(queue.as_str()) {
            entry.fail_deletes = enabled;
        }
    }

    /// Whether a queue exists
    pub fn queue_exists(&self, queue: &QueueUrl) -> bool {
        self.lock().queues.contains_key(queue.as_str())
    }

    /// Snapshot of the visible messages on a queue, in order
    pub fn visible_messages(&self, queue: &QueueUrl) -> Vec<Message> {
        self.lock()
            .queues
            .get(queue.as_str())
            .map(|q| q.visible.iter().map(|m| m.message.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of messages currently locked by a consuming receive
    pub fn in_flight_count(&self, queue: &QueueUrl) -> usize {
        self.lock()
            .queues
            .get(queue.as_str())
            .map(|q| q.in_flight.len())
            .unwrap_or(0)
    }

    /// The recorded operation trace, in issue order
    pub fn operations(&self) -> Vec<Operation> {
        self.lock().operations.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueStorage> {
        self.storage.lock().unwrap_or_else(|poisoned| {
            // A panicked test thread must not hide state from the assertions
            // that follow.
            poisoned.into_inner()
        })
    }

    /// One receive attempt; returns `None` when no messages are available
    fn try_receive(
        &self,
        queue: &QueueUrl,
        options: &ReceiveOptions,
        record: bool,
    ) -> Result<Option<Vec<ReceivedMessage>>, QueueError> {
        let mut storage = self.lock();
        if record {
            storage.record(
                queue,
                OperationKind::Receive {
                    consuming: options.is_consuming(),
                },
            );
        }

        let config = storage.config.clone();
        let entry = storage.queue_mut(queue)?;
        let now = Utc::now();
        entry.reclaim_expired(now);

        if entry.visible.is_empty() {
            return Ok(None);
        }

        let count = (options.max_messages.min(MAX_RECEIVE_BATCH) as usize).max(1);

        if !options.is_consuming() {
            // Peek: hand out copies but leave the messages visible. The
            // issued receipt handles are deliberately not tracked; deleting
            // through one fails, as it would against the real provider once
            // the zero-length visibility window has lapsed.
            let peeked = entry
                .visible
                .iter()
                .take(count)
                .map(|m| m.to_received(ReceiptHandle::new(uuid::Uuid::new_v4().to_string())))
                .collect();
            return Ok(Some(peeked));
        }

        let visibility = entry.visibility_timeout(options, &config);
        let mut received = Vec::new();
        for _ in 0..count {
            let Some(stored) = entry.visible.pop_front() else {
                break;
            };
            let handle = uuid::Uuid::new_v4().to_string();
            received.push(stored.to_received(ReceiptHandle::new(handle.clone())));
            entry.in_flight.insert(
                handle,
                InFlightMessage {
                    message: stored,
                    visible_again_at: now + visibility,
                },
            );
        }

        Ok(Some(received))
    }
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new(InMemoryConfig::default())
    }
}

#[async_trait]
impl QueueProvider for InMemoryProvider {
    async fn describe_queue(&self, queue: &QueueUrl) -> Result<QueueAttributes, QueueError> {
        let mut storage = self.lock();
        storage.record(queue, OperationKind::Describe);
        storage.queue_mut(queue).map(|q| q.attributes.clone())
    }

    async fn create_queue(
        &self,
        queue: &QueueUrl,
        attributes: &QueueAttributes,
    ) -> Result<QueueUrl, QueueError> {
        let mut storage = self.lock();
        storage.record(queue, OperationKind::Create);
        storage
            .queues
            .insert(queue.as_str().to_string(), InMemoryQueue::new(attributes.clone()));
        Ok(queue.clone())
    }

    async fn receive_messages(
        &self,
        queue: &QueueUrl,
        options: &ReceiveOptions,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        // The trace records one entry per receive call, not per poll attempt.
        let mut recorded = false;
        let deadline = tokio::time::Instant::now()
            + options
                .wait_time
                .to_std()
                .unwrap_or(std::time::Duration::ZERO);

        loop {
            if let Some(messages) = self.try_receive(queue, options, !recorded)? {
                return Ok(messages);
            }
            recorded = true;

            if tokio::time::Instant::now() >= deadline {
                return Ok(Vec::new());
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }

    async fn send_message(
        &self,
        queue: &QueueUrl,
        message: &Message,
    ) -> Result<MessageId, QueueError> {
        let mut storage = self.lock();
        storage.record(
            queue,
            OperationKind::Send {
                body: message.body.clone(),
            },
        );

        let entry = storage.queue_mut(queue)?;
        if entry.fail_sends {
            return Err(QueueError::ProviderError {
                code: "InternalError".to_string(),
                message: "injected send failure".to_string(),
            });
        }

        let message_id = MessageId::new(uuid::Uuid::new_v4().to_string());
        entry.visible.push_back(StoredMessage {
            message_id: message_id.clone(),
            message: message.clone(),
        });
        Ok(message_id)
    }

    async fn delete_message(
        &self,
        queue: &QueueUrl,
        receipt: &ReceiptHandle,
    ) -> Result<(), QueueError> {
        let mut storage = self.lock();
        storage.record(
            queue,
            OperationKind::Delete {
                receipt: receipt.as_str().to_string(),
            },
        );

        let entry = storage.queue_mut(queue)?;
        if entry.fail_deletes {
            return Err(QueueError::ProviderError {
                code: "InternalError".to_string(),
                message: "injected delete failure".to_string(),
            });
        }

        if entry.in_flight.remove(receipt.as_str()).is_none() {
            return Err(QueueError::ReceiptInvalid {
                receipt: receipt.as_str().to_string(),
            });
        }
        Ok(())
    }
}
