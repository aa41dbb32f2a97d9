//! # Queue Mover Runtime
//!
//! Provider boundary for the queue-mover daemon: domain types for queues and
//! messages, the error taxonomy, and the [`QueueProvider`] trait with its AWS
//! SQS and in-memory implementations.
//!
//! ## Module Organization
//!
//! - [error] - Error types for all queue operations
//! - [message] - Queue references, messages, and receipt handles
//! - [client] - The provider trait
//! - [providers] - AWS SQS and in-memory provider implementations

// Module declarations
pub mod client;
pub mod error;
pub mod message;
pub mod providers;

// Re-export commonly used types at crate root for convenience
pub use client::{QueueProvider, MAX_RECEIVE_BATCH};
pub use error::{QueueError, ValidationError};
pub use message::{
    Message, MessageAttribute, MessageId, QueueAttributes, QueuePair, QueueUrl, ReceiptHandle,
    ReceiveOptions, ReceivedMessage,
};
pub use providers::{AwsSqsProvider, InMemoryProvider};
