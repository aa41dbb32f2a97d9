//! Error types for queue operations.

use thiserror::Error;

/// Error type for all queue provider operations
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue not found: {queue}")]
    QueueNotFound { queue: String },

    #[error("Receipt handle invalid, already used, or expired: {receipt}")]
    ReceiptInvalid { receipt: String },

    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Provider error: {code} - {message}")]
    ProviderError { code: String, message: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl QueueError {
    /// Check if error is transient and a later pass may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::QueueNotFound { .. } => false,
            Self::ReceiptInvalid { .. } => false,
            Self::ConnectionFailed { .. } => true,
            Self::ProviderError { .. } => true,
            Self::Validation(_) => false,
        }
    }

    /// Check whether this is the expected not-found case rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::QueueNotFound { .. })
    }
}

/// Validation errors for domain types
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid queue URL '{url}': {message}")]
    InvalidQueueUrl { url: String, message: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
