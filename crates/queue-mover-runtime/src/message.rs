//! Queue references, messages, and receipt handles.

use crate::error::ValidationError;
use bytes::Bytes;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

// ============================================================================
// Queue References
// ============================================================================

/// Validated queue locator encoding region and queue name
///
/// Queue URLs follow the SQS shape
/// `https://sqs.<region>.amazonaws.com/<account>/<name>`. The region and name
/// are parsed out at construction so every later access is infallible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QueueUrl {
    url: String,
    region: String,
    name: String,
}

impl QueueUrl {
    /// Create a queue URL, validating that a region and name can be derived
    pub fn new(url: String) -> Result<Self, ValidationError> {
        let parsed = url::Url::parse(&url).map_err(|e| ValidationError::InvalidQueueUrl {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let host = parsed
            .host_str()
            .ok_or_else(|| ValidationError::InvalidQueueUrl {
                url: url.clone(),
                message: "missing host".to_string(),
            })?;

        // Region is the second host label, e.g. sqs.us-east-1.amazonaws.com
        let region = host
            .split('.')
            .nth(1)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| ValidationError::InvalidQueueUrl {
                url: url.clone(),
                message: "host does not encode a region".to_string(),
            })?
            .to_string();

        let name = parsed
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ValidationError::InvalidQueueUrl {
                url: url.clone(),
                message: "path does not end in a queue name".to_string(),
            })?
            .to_string();

        Ok(Self { url, region, name })
    }

    /// Full queue URL as a string
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Region encoded in the URL host
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Queue name (last path segment)
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for QueueUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl FromStr for QueueUrl {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for QueueUrl {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QueueUrl> for String {
    fn from(value: QueueUrl) -> Self {
        value.url
    }
}

/// A source queue paired with the destination its messages move to
///
/// Immutable for the lifetime of the process; loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuePair {
    pub source: QueueUrl,
    pub destination: QueueUrl,
}

impl QueuePair {
    pub fn new(source: QueueUrl, destination: QueueUrl) -> Self {
        Self {
            source,
            destination,
        }
    }
}

// ============================================================================
// Queue Attributes
// ============================================================================

/// The queue attributes mirrored from source to destination at creation time
///
/// All fields are optional string values, matching the provider's attribute
/// map. Fields absent on the source are omitted on create, never defaulted.
/// This is a one-shot template: attributes are copied exactly once when the
/// destination queue is created and never re-applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueAttributes {
    pub delay_seconds: Option<String>,
    pub maximum_message_size: Option<String>,
    pub message_retention_period: Option<String>,
    pub policy: Option<String>,
    pub receive_wait_time_seconds: Option<String>,
    pub visibility_timeout: Option<String>,
}

impl QueueAttributes {
    /// Build from a provider attribute map, ignoring unrecognized keys
    pub fn from_map(attributes: &HashMap<String, String>) -> Self {
        Self {
            delay_seconds: attributes.get("DelaySeconds").cloned(),
            maximum_message_size: attributes.get("MaximumMessageSize").cloned(),
            message_retention_period: attributes.get("MessageRetentionPeriod").cloned(),
            policy: attributes.get("Policy").cloned(),
            receive_wait_time_seconds: attributes.get("ReceiveMessageWaitTimeSeconds").cloned(),
            visibility_timeout: attributes.get("VisibilityTimeout").cloned(),
        }
    }

    /// Present fields as provider attribute-map entries; absent fields are omitted
    pub fn to_entries(&self) -> Vec<(&'static str, &str)> {
        let mut entries = Vec::new();
        if let Some(ref v) = self.delay_seconds {
            entries.push(("DelaySeconds", v.as_str()));
        }
        if let Some(ref v) = self.maximum_message_size {
            entries.push(("MaximumMessageSize", v.as_str()));
        }
        if let Some(ref v) = self.message_retention_period {
            entries.push(("MessageRetentionPeriod", v.as_str()));
        }
        if let Some(ref v) = self.policy {
            entries.push(("Policy", v.as_str()));
        }
        if let Some(ref v) = self.receive_wait_time_seconds {
            entries.push(("ReceiveMessageWaitTimeSeconds", v.as_str()));
        }
        if let Some(ref v) = self.visibility_timeout {
            entries.push(("VisibilityTimeout", v.as_str()));
        }
        entries
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// Provider-assigned message identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Single-use token authorizing deletion of one received message instance
///
/// Valid only against the queue it was issued by; the provider rejects reuse
/// after deletion or after the visibility timeout has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptHandle(String);

impl ReceiptHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single message attribute value
///
/// Both the string and binary forms must round-trip byte-exact through the
/// move; the mover never interprets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAttribute {
    pub data_type: String,
    pub string_value: Option<String>,
    pub binary_value: Option<Bytes>,
}

impl MessageAttribute {
    /// String-typed attribute
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            data_type: "String".to_string(),
            string_value: Some(value.into()),
            binary_value: None,
        }
    }

    /// Binary-typed attribute
    pub fn binary(value: impl Into<Bytes>) -> Self {
        Self {
            data_type: "Binary".to_string(),
            string_value: None,
            binary_value: Some(value.into()),
        }
    }
}

/// A message to be sent to a queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub body: String,
    pub attributes: HashMap<String, MessageAttribute>,
}

impl Message {
    /// Create new message with body
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            attributes: HashMap::new(),
        }
    }

    /// Add a message attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: MessageAttribute) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// A message received from a queue, locked for one visibility window
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub message_id: MessageId,
    pub body: String,
    pub attributes: HashMap<String, MessageAttribute>,
    pub receipt_handle: ReceiptHandle,
}

impl ReceivedMessage {
    /// Convert back to a sendable message
    ///
    /// The copy carries the body and attribute map only; the provider assigns
    /// a new identity on send.
    pub fn message(&self) -> Message {
        Message {
            body: self.body.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

// ============================================================================
// Receive Options
// ============================================================================

/// Configuration options for receiving messages from queues
#[derive(Debug, Clone)]
pub struct ReceiveOptions {
    /// Maximum number of messages to receive (provider cap is 10)
    pub max_messages: u32,
    /// Long-poll wait bound; zero means return immediately
    pub wait_time: Duration,
    /// Visibility timeout override; zero leaves observed messages visible
    /// (a non-consuming peek), `None` uses the queue default
    pub visibility_timeout: Option<Duration>,
}

impl Default for ReceiveOptions {
    fn default() -> Self {
        Self {
            max_messages: 10,
            wait_time: Duration::zero(),
            visibility_timeout: None,
        }
    }
}

impl ReceiveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_messages(mut self, max: u32) -> Self {
        self.max_messages = max;
        self
    }

    pub fn with_wait_time(mut self, wait: Duration) -> Self {
        self.wait_time = wait;
        self
    }

    pub fn with_visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = Some(timeout);
        self
    }

    /// Whether this receive consumes messages (locks them) or only peeks
    pub fn is_consuming(&self) -> bool {
        self.visibility_timeout != Some(Duration::zero())
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
