//! Shared fixtures for the daemon-level tests.
//!
//! Everything runs against the in-memory provider; the scenarios exercise the
//! full supervisor/mover/watcher stack exactly as the binary wires it, with
//! only the provider swapped.

use queue_mover_runtime::providers::{InMemoryConfig, InMemoryProvider};
use queue_mover_runtime::{Message, QueueAttributes, QueuePair, QueueUrl};
use std::sync::Arc;
use std::time::Duration;

/// Long-poll wait used by every scenario; short enough that shutdown and
/// wake latencies stay far under the test timeouts
pub const TEST_POLL_WAIT_MS: i64 = 50;

pub fn queue_url(name: &str) -> QueueUrl {
    QueueUrl::new(format!(
        "https://sqs.us-east-1.amazonaws.com/123456789012/{name}"
    ))
    .expect("valid queue url")
}

pub fn provider() -> Arc<InMemoryProvider> {
    Arc::new(InMemoryProvider::default())
}

#[allow(dead_code)]
pub fn provider_with_visibility(visibility: chrono::Duration) -> Arc<InMemoryProvider> {
    Arc::new(InMemoryProvider::new(InMemoryConfig {
        default_visibility_timeout: visibility,
    }))
}

/// Register a source queue and pair it with an unregistered destination
pub fn pair_with_source(
    provider: &InMemoryProvider,
    source: &str,
    destination: &str,
    attributes: QueueAttributes,
) -> QueuePair {
    let pair = QueuePair::new(queue_url(source), queue_url(destination));
    provider.register_queue(&pair.source, attributes);
    pair
}

pub fn messages(count: usize) -> Vec<Message> {
    (0..count)
        .map(|i| Message::new(format!("payload-{i}")))
        .collect()
}

#[allow(dead_code)]
pub fn sorted_bodies(messages: &[Message]) -> Vec<String> {
    let mut bodies: Vec<String> = messages.iter().map(|m| m.body.clone()).collect();
    bodies.sort();
    bodies
}

/// Poll until the destination holds at least `expected` visible messages
#[allow(dead_code)]
pub async fn await_visible(provider: &InMemoryProvider, queue: &QueueUrl, expected: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if provider.visible_messages(queue).len() >= expected {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "queue never reached {expected} visible messages"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
