use super::*;
use queue_mover_runtime::providers::{InMemoryConfig, InMemoryProvider, OperationKind};
use queue_mover_runtime::{Message, MessageAttribute, QueueUrl};

fn queue_url(name: &str) -> QueueUrl {
    QueueUrl::new(format!(
        "https://sqs.us-east-1.amazonaws.com/123456789012/{name}"
    ))
    .expect("valid queue url")
}

struct Fixture {
    queues: Arc<InMemoryProvider>,
    provider: Arc<dyn QueueProvider>,
    pair: QueuePair,
}

fn fixture() -> Fixture {
    let queues = Arc::new(InMemoryProvider::default());
    let pair = QueuePair::new(queue_url("src"), queue_url("dst"));
    queues.register_queue(&pair.source, Default::default());
    queues.register_queue(&pair.destination, Default::default());
    let provider: Arc<dyn QueueProvider> = Arc::clone(&queues) as Arc<dyn QueueProvider>;
    Fixture {
        queues,
        provider,
        pair,
    }
}

fn bodies(messages: &[Message]) -> Vec<String> {
    let mut bodies: Vec<String> = messages.iter().map(|m| m.body.clone()).collect();
    bodies.sort();
    bodies
}

#[tokio::test]
async fn test_empty_source_is_a_no_op() {
    let f = fixture();

    let outcome = transfer(&f.provider, "queue-1", &f.pair)
        .await
        .expect("empty pass succeeds");

    assert_eq!(outcome, TransferOutcome::default());
    assert!(f.queues.visible_messages(&f.pair.destination).is_empty());
}

#[tokio::test]
async fn test_every_batch_size_moves_byte_equal_copies() {
    for n in 1..=10usize {
        let f = fixture();
        let seeded: Vec<Message> = (0..n).map(|i| Message::new(format!("payload-{i}"))).collect();
        f.queues.seed_messages(&f.pair.source, seeded.clone());

        let outcome = transfer(&f.provider, "queue-1", &f.pair)
            .await
            .unwrap_or_else(|e| panic!("pass of {n} messages failed: {e}"));

        assert_eq!(outcome.moved, n, "batch of {n}");
        assert_eq!(outcome.retained, 0, "batch of {n}");
        assert!(f.queues.visible_messages(&f.pair.source).is_empty());
        assert_eq!(f.queues.in_flight_count(&f.pair.source), 0);
        assert_eq!(
            bodies(&f.queues.visible_messages(&f.pair.destination)),
            bodies(&seeded),
            "batch of {n}"
        );
    }
}

#[tokio::test]
async fn test_message_attributes_survive_the_move() {
    let f = fixture();
    let message = Message::new("with attributes")
        .with_attribute("trace", MessageAttribute::string("abc-123"))
        .with_attribute("payload", MessageAttribute::binary(vec![0u8, 159, 146]));
    f.queues.seed_messages(&f.pair.source, vec![message.clone()]);

    transfer(&f.provider, "queue-1", &f.pair)
        .await
        .expect("pass succeeds");

    let delivered = f.queues.visible_messages(&f.pair.destination);
    assert_eq!(delivered, vec![message]);
}

#[tokio::test]
async fn test_copy_is_written_before_the_original_is_deleted() {
    let f = fixture();
    f.queues
        .seed_messages(&f.pair.source, vec![Message::new("ordered")]);

    transfer(&f.provider, "queue-1", &f.pair)
        .await
        .expect("pass succeeds");

    let kinds: Vec<OperationKind> = f.queues.operations().into_iter().map(|op| op.kind).collect();
    let send_at = kinds
        .iter()
        .position(|k| matches!(k, OperationKind::Send { .. }))
        .expect("a send was issued");
    let delete_at = kinds
        .iter()
        .position(|k| matches!(k, OperationKind::Delete { .. }))
        .expect("a delete was issued");
    assert!(send_at < delete_at, "send must precede delete: {kinds:?}");
}

#[tokio::test]
async fn test_a_pass_moves_at_most_one_receive_batch() {
    let f = fixture();
    let seeded: Vec<Message> = (0..12).map(|i| Message::new(format!("payload-{i}"))).collect();
    f.queues.seed_messages(&f.pair.source, seeded);

    let outcome = transfer(&f.provider, "queue-1", &f.pair)
        .await
        .expect("pass succeeds");

    assert_eq!(outcome.moved, 10);
    assert_eq!(f.queues.visible_messages(&f.pair.source).len(), 2);
    assert_eq!(f.queues.visible_messages(&f.pair.destination).len(), 10);
}

#[tokio::test]
async fn test_failed_send_retains_the_message_on_the_source() {
    let f = fixture();
    f.queues
        .seed_messages(&f.pair.source, vec![Message::new("sticky")]);
    f.queues.fail_sends(&f.pair.destination, true);

    let outcome = transfer(&f.provider, "queue-1", &f.pair)
        .await
        .expect("retained sends are not fatal");

    assert_eq!(outcome.moved, 0);
    assert_eq!(outcome.retained, 1);
    // Still locked on the source; it reappears when its visibility lapses.
    assert_eq!(f.queues.in_flight_count(&f.pair.source), 1);
    assert!(f.queues.visible_messages(&f.pair.destination).is_empty());

    // No delete is ever issued for a message whose copy was not written.
    let deletes = f
        .queues
        .operations()
        .into_iter()
        .filter(|op| matches!(op.kind, OperationKind::Delete { .. }))
        .count();
    assert_eq!(deletes, 0);
}

#[tokio::test]
async fn test_mixed_outcomes_count_moved_and_retained_separately() {
    let f = fixture();
    f.queues.seed_messages(
        &f.pair.source,
        (0..4).map(|i| Message::new(format!("payload-{i}"))).collect(),
    );

    // First pass with sends failing: everything is retained.
    f.queues.fail_sends(&f.pair.destination, true);
    let first = transfer(&f.provider, "queue-1", &f.pair)
        .await
        .expect("retained pass");
    assert_eq!(first.retained, 4);

    // Once sends recover, a later pass moves whatever has become visible
    // again; here nothing is visible yet, so the pass is empty.
    f.queues.fail_sends(&f.pair.destination, false);
    let second = transfer(&f.provider, "queue-1", &f.pair)
        .await
        .expect("empty pass");
    assert_eq!(second, TransferOutcome::default());
}

#[tokio::test]
async fn test_failed_delete_after_send_is_fatal() {
    let f = fixture();
    f.queues
        .seed_messages(&f.pair.source, vec![Message::new("duplicated")]);
    f.queues.fail_deletes(&f.pair.source, true);

    let err = transfer(&f.provider, "queue-1", &f.pair)
        .await
        .expect_err("a confirmed duplicate is fatal");

    match err {
        MoverError::DeleteFailed { pair_id, .. } => assert_eq!(pair_id, "queue-1"),
        other => panic!("expected DeleteFailed, got {other:?}"),
    }

    // The copy was written before the delete was attempted.
    assert_eq!(f.queues.visible_messages(&f.pair.destination).len(), 1);
}

#[tokio::test]
async fn test_fatal_pass_still_joins_every_sibling_move() {
    let f = fixture();
    f.queues.seed_messages(
        &f.pair.source,
        (0..5).map(|i| Message::new(format!("payload-{i}"))).collect(),
    );
    f.queues.fail_deletes(&f.pair.source, true);

    let err = transfer(&f.provider, "queue-1", &f.pair).await;
    assert!(matches!(err, Err(MoverError::DeleteFailed { .. })));

    // Every in-flight send completed before the error surfaced.
    assert_eq!(f.queues.visible_messages(&f.pair.destination).len(), 5);
    let sends = f
        .queues
        .operations()
        .into_iter()
        .filter(|op| matches!(op.kind, OperationKind::Send { .. }))
        .count();
    assert_eq!(sends, 5);
}

#[tokio::test]
async fn test_receive_failure_is_fatal() {
    let f = fixture();
    let orphan_pair = QueuePair::new(queue_url("missing"), f.pair.destination.clone());

    let err = transfer(&f.provider, "queue-1", &orphan_pair)
        .await
        .expect_err("missing source queue");

    assert!(matches!(err, MoverError::Receive { .. }));
}
