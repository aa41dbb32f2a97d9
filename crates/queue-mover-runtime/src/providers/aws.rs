//! AWS SQS provider implementation.
//!
//! Wraps the official AWS SDK. One provider is constructed per region, taken
//! from the region embedded in the queue URLs; pairs whose sources live in
//! the same region share a provider.
//!
//! ## Authentication
//!
//! Credentials come from the SDK's default provider chain (environment,
//! shared config/credentials files, IAM roles). Only the region is set
//! explicitly, taken from the queue URL.

use crate::client::{QueueProvider, MAX_RECEIVE_BATCH};
use crate::error::QueueError;
use crate::message::{
    Message, MessageAttribute, MessageId, QueueAttributes, QueueUrl, ReceiptHandle, ReceiveOptions,
    ReceivedMessage,
};
use async_trait::async_trait;
use aws_sdk_sqs::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_sqs::primitives::Blob;
use aws_sdk_sqs::types::{MessageAttributeValue, QueueAttributeName};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// AWS SQS queue provider
///
/// Thin adapter from the [`QueueProvider`] operations to the SQS API. The
/// underlying SDK client is cheap to clone and internally pooled, so one
/// provider per region serves every pair in that region.
pub struct AwsSqsProvider {
    client: aws_sdk_sqs::Client,
    region: String,
}

impl AwsSqsProvider {
    /// Create a provider for one region using the default credential chain
    pub async fn for_region(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        Self {
            client: aws_sdk_sqs::Client::new(&config),
            region: region.to_string(),
        }
    }

    /// Region this provider's client is bound to
    pub fn region(&self) -> &str {
        &self.region
    }
}

impl fmt::Debug for AwsSqsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsSqsProvider")
            .field("region", &self.region)
            .finish()
    }
}

/// Map an SDK error to the provider-agnostic taxonomy
///
/// Not-found and invalid-receipt service codes become their dedicated
/// variants so callers can branch on them; transport-level failures become
/// `ConnectionFailed`; everything else keeps its service code.
fn map_sdk_error<E, R>(operation: &str, queue: &QueueUrl, err: SdkError<E, R>) -> QueueError
where
    E: ProvideErrorMetadata + fmt::Debug,
    R: fmt::Debug,
{
    match err {
        SdkError::ServiceError(ctx) => {
            let code = ctx.err().code().unwrap_or("Unknown").to_string();
            let message = ctx.err().message().unwrap_or("no message").to_string();
            match code.as_str() {
                "AWS.SimpleQueueService.NonExistentQueue" | "QueueDoesNotExist" => {
                    QueueError::QueueNotFound {
                        queue: queue.as_str().to_string(),
                    }
                }
                "ReceiptHandleIsInvalid" | "InvalidReceiptHandle" => QueueError::ReceiptInvalid {
                    receipt: format!("{}: {}", code, message),
                },
                _ => QueueError::ProviderError {
                    code,
                    message: format!("{}: {}", operation, message),
                },
            }
        }
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => QueueError::ConnectionFailed {
            message: format!("{}: {:?}", operation, err),
        },
        other => QueueError::ConnectionFailed {
            message: format!("{}: {:?}", operation, other),
        },
    }
}

/// Convert our attribute value to the SDK's
fn to_sdk_attribute(
    key: &str,
    attribute: &MessageAttribute,
) -> Result<MessageAttributeValue, QueueError> {
    let mut builder = MessageAttributeValue::builder().data_type(&attribute.data_type);
    if let Some(ref value) = attribute.string_value {
        builder = builder.string_value(value);
    }
    if let Some(ref value) = attribute.binary_value {
        builder = builder.binary_value(Blob::new(value.to_vec()));
    }
    builder.build().map_err(|e| QueueError::ProviderError {
        code: "InvalidMessageAttribute".to_string(),
        message: format!("attribute '{}': {}", key, e),
    })
}

/// Convert the SDK's attribute value to ours, byte-for-byte
fn from_sdk_attribute(value: &MessageAttributeValue) -> MessageAttribute {
    MessageAttribute {
        data_type: value.data_type().to_string(),
        string_value: value.string_value().map(str::to_string),
        binary_value: value
            .binary_value()
            .map(|blob| bytes::Bytes::from(blob.clone().into_inner())),
    }
}

const ATTRIBUTE_NAMES: [(&str, QueueAttributeName); 6] = [
    ("DelaySeconds", QueueAttributeName::DelaySeconds),
    ("MaximumMessageSize", QueueAttributeName::MaximumMessageSize),
    (
        "MessageRetentionPeriod",
        QueueAttributeName::MessageRetentionPeriod,
    ),
    ("Policy", QueueAttributeName::Policy),
    (
        "ReceiveMessageWaitTimeSeconds",
        QueueAttributeName::ReceiveMessageWaitTimeSeconds,
    ),
    ("VisibilityTimeout", QueueAttributeName::VisibilityTimeout),
];

#[async_trait]
impl QueueProvider for AwsSqsProvider {
    async fn describe_queue(&self, queue: &QueueUrl) -> Result<QueueAttributes, QueueError> {
        let output = self
            .client
            .get_queue_attributes()
            .queue_url(queue.as_str())
            .attribute_names(QueueAttributeName::All)
            .send()
            .await
            .map_err(|e| map_sdk_error("GetQueueAttributes", queue, e))?;

        let mut attributes = HashMap::new();
        if let Some(map) = output.attributes {
            for (name, value) in map {
                attributes.insert(name.as_str().to_string(), value);
            }
        }

        Ok(QueueAttributes::from_map(&attributes))
    }

    async fn create_queue(
        &self,
        queue: &QueueUrl,
        attributes: &QueueAttributes,
    ) -> Result<QueueUrl, QueueError> {
        let mut request = self.client.create_queue().queue_name(queue.name());

        let entries: HashMap<&str, &str> = attributes.to_entries().into_iter().collect();
        for (name, attribute_name) in ATTRIBUTE_NAMES {
            if let Some(value) = entries.get(name) {
                request = request.attributes(attribute_name, *value);
            }
        }

        let output = request
            .send()
            .await
            .map_err(|e| map_sdk_error("CreateQueue", queue, e))?;

        let created = output.queue_url.ok_or_else(|| QueueError::ProviderError {
            code: "MissingQueueUrl".to_string(),
            message: "CreateQueue response did not include a queue URL".to_string(),
        })?;

        debug!(queue = %created, region = %self.region, "queue created");
        Ok(QueueUrl::new(created)?)
    }

    async fn receive_messages(
        &self,
        queue: &QueueUrl,
        options: &ReceiveOptions,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        let mut request = self
            .client
            .receive_message()
            .queue_url(queue.as_str())
            .max_number_of_messages(options.max_messages.min(MAX_RECEIVE_BATCH) as i32)
            .wait_time_seconds(options.wait_time.num_seconds().clamp(0, 20) as i32)
            .message_attribute_names("All");

        if let Some(visibility) = options.visibility_timeout {
            request = request.visibility_timeout(visibility.num_seconds() as i32);
        }

        let output = request
            .send()
            .await
            .map_err(|e| map_sdk_error("ReceiveMessage", queue, e))?;

        let mut messages = Vec::new();
        for message in output.messages.unwrap_or_default() {
            let receipt_handle =
                message
                    .receipt_handle
                    .ok_or_else(|| QueueError::ProviderError {
                        code: "MissingReceiptHandle".to_string(),
                        message: "received message without a receipt handle".to_string(),
                    })?;

            let attributes = message
                .message_attributes
                .unwrap_or_default()
                .iter()
                .map(|(key, value)| (key.clone(), from_sdk_attribute(value)))
                .collect();

            messages.push(ReceivedMessage {
                message_id: MessageId::new(message.message_id.unwrap_or_default()),
                body: message.body.unwrap_or_default(),
                attributes,
                receipt_handle: ReceiptHandle::new(receipt_handle),
            });
        }

        if !messages.is_empty() {
            debug!(queue = %queue, count = messages.len(), "received messages");
        }
        Ok(messages)
    }

    async fn send_message(
        &self,
        queue: &QueueUrl,
        message: &Message,
    ) -> Result<MessageId, QueueError> {
        let mut request = self
            .client
            .send_message()
            .queue_url(queue.as_str())
            .message_body(&message.body);

        for (key, attribute) in &message.attributes {
            request = request.message_attributes(key, to_sdk_attribute(key, attribute)?);
        }

        let output = request
            .send()
            .await
            .map_err(|e| map_sdk_error("SendMessage", queue, e))?;

        Ok(MessageId::new(output.message_id.unwrap_or_default()))
    }

    async fn delete_message(
        &self,
        queue: &QueueUrl,
        receipt: &ReceiptHandle,
    ) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(queue.as_str())
            .receipt_handle(receipt.as_str())
            .send()
            .await
            .map_err(|e| map_sdk_error("DeleteMessage", queue, e))?;

        Ok(())
    }
}

#[cfg(test)]
#[path = "aws_tests.rs"]
mod tests;
