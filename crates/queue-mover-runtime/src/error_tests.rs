//! Tests for error types.

use super::*;

#[test]
fn test_not_found_is_not_transient() {
    let err = QueueError::QueueNotFound {
        queue: "https://sqs.us-east-1.amazonaws.com/123/missing".to_string(),
    };
    assert!(!err.is_transient());
    assert!(err.is_not_found());
}

#[test]
fn test_receipt_invalid_is_permanent() {
    let err = QueueError::ReceiptInvalid {
        receipt: "stale-handle".to_string(),
    };
    assert!(!err.is_transient());
    assert!(!err.is_not_found());
}

#[test]
fn test_connection_failed_is_transient() {
    let err = QueueError::ConnectionFailed {
        message: "timed out".to_string(),
    };
    assert!(err.is_transient());
}

#[test]
fn test_error_display_includes_context() {
    let err = QueueError::ProviderError {
        code: "InternalError".to_string(),
        message: "SendMessage: boom".to_string(),
    };
    let rendered = err.to_string();
    assert!(rendered.contains("InternalError"));
    assert!(rendered.contains("SendMessage: boom"));
}

#[test]
fn test_validation_error_converts() {
    let err: QueueError = ValidationError::Required {
        field: "queue_url".to_string(),
    }
    .into();
    assert!(!err.is_transient());
    assert!(err.to_string().contains("queue_url"));
}
