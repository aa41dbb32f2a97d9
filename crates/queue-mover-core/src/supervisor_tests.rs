use super::*;
use queue_mover_runtime::providers::InMemoryProvider;
use queue_mover_runtime::{Message, QueueUrl};
use std::time::Duration as StdDuration;
use tokio::time::timeout;

fn queue_url(name: &str) -> QueueUrl {
    QueueUrl::new(format!(
        "https://sqs.us-east-1.amazonaws.com/123456789012/{name}"
    ))
    .expect("valid queue url")
}

fn registered_pair(provider: &InMemoryProvider, source: &str, destination: &str) -> QueuePair {
    let pair = QueuePair::new(queue_url(source), queue_url(destination));
    provider.register_queue(&pair.source, Default::default());
    pair
}

async fn await_delivery(provider: &InMemoryProvider, destination: &QueueUrl, expected: usize) {
    let deadline = tokio::time::Instant::now() + StdDuration::from_secs(2);
    loop {
        if provider.visible_messages(destination).len() >= expected {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "destination never reached {expected} messages"
        );
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_runs_every_pair_until_shutdown() {
    let provider = Arc::new(InMemoryProvider::default());
    let first = registered_pair(&provider, "src-1", "dst-1");
    let second = registered_pair(&provider, "src-2", "dst-2");
    provider.seed_messages(&first.source, vec![Message::new("a"), Message::new("b")]);
    provider.seed_messages(&second.source, vec![Message::new("c")]);

    let controller = ShutdownController::new();
    let supervisor = Supervisor::new().with_poll_wait(Duration::milliseconds(50));
    let shared: Arc<dyn QueueProvider> = Arc::clone(&provider) as Arc<dyn QueueProvider>;
    let task = tokio::spawn(supervisor.run(
        vec![
            (first.clone(), Arc::clone(&shared)),
            (second.clone(), Arc::clone(&shared)),
        ],
        controller.clone(),
    ));

    await_delivery(&provider, &first.destination, 2).await;
    await_delivery(&provider, &second.destination, 1).await;

    controller.signal();
    let result = timeout(StdDuration::from_secs(2), task)
        .await
        .expect("supervisor stops after shutdown")
        .expect("supervisor task does not panic");
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_first_fatal_error_stops_every_mover() {
    let provider = Arc::new(InMemoryProvider::default());
    let healthy = registered_pair(&provider, "src-1", "dst-1");
    let failing = registered_pair(&provider, "src-2", "dst-2");
    provider.seed_messages(&failing.source, vec![Message::new("duplicated")]);
    provider.fail_deletes(&failing.source, true);

    let controller = ShutdownController::new();
    let supervisor = Supervisor::new().with_poll_wait(Duration::milliseconds(50));
    let shared: Arc<dyn QueueProvider> = Arc::clone(&provider) as Arc<dyn QueueProvider>;

    // No external shutdown: the failing pair must bring the group down.
    let result = timeout(
        StdDuration::from_secs(2),
        supervisor.run(
            vec![
                (healthy.clone(), Arc::clone(&shared)),
                (failing.clone(), Arc::clone(&shared)),
            ],
            controller.clone(),
        ),
    )
    .await
    .expect("the group stops after the first fatal error");

    match result {
        Err(MoverError::DeleteFailed { pair_id, .. }) => assert_eq!(pair_id, "queue-2"),
        other => panic!("expected DeleteFailed, got {other:?}"),
    }

    // The supervisor raised the shared shutdown on the way out.
    assert!(controller.subscribe().is_signaled());
}

#[tokio::test]
async fn test_missing_source_on_one_pair_fails_the_run() {
    let provider = Arc::new(InMemoryProvider::default());
    let healthy = registered_pair(&provider, "src-1", "dst-1");
    // Second pair's source was never registered.
    let orphan = QueuePair::new(queue_url("src-2"), queue_url("dst-2"));

    let controller = ShutdownController::new();
    let supervisor = Supervisor::new().with_poll_wait(Duration::milliseconds(50));
    let shared: Arc<dyn QueueProvider> = Arc::clone(&provider) as Arc<dyn QueueProvider>;

    let result = timeout(
        StdDuration::from_secs(2),
        supervisor.run(
            vec![
                (healthy, Arc::clone(&shared)),
                (orphan, Arc::clone(&shared)),
            ],
            controller,
        ),
    )
    .await
    .expect("provisioning failure ends the run");

    match result {
        Err(MoverError::SourceQueueMissing { pair_id, .. }) => assert_eq!(pair_id, "queue-2"),
        other => panic!("expected SourceQueueMissing, got {other:?}"),
    }
}

#[tokio::test]
async fn test_no_pairs_is_an_immediate_clean_stop() {
    let controller = ShutdownController::new();
    let result = Supervisor::new().run(vec![], controller).await;
    assert!(result.is_ok());
}
