use std::thread;
use std::time::Duration;

use pubsub_rust::{
    CommitFault, IterationOutcome, MessagingError, Queue, QueueAdmin, TransactionalMessaging,
};

use crate::support::Fixture;

#[test]
fn five_topics_then_one_consume_iteration() {
    let fixture = Fixture::with_queues(5);

    let report = fixture
        .messaging
        .publish_to_topics(&fixture.topics, 3)
        .unwrap();
    assert_eq!(report.committed(), 5);
    assert_eq!(fixture.depths(), vec![3; 5]);

    let consumed = fixture
        .messaging
        .receive_from_queues(&fixture.queues, 1)
        .unwrap();

    assert_eq!(consumed.messages.len(), 5);
    assert_eq!(consumed.iterations, vec![IterationOutcome::Committed { received: 5 }]);
    for (i, message) in consumed.messages.iter().enumerate() {
        assert_eq!(
            message.payload_str(),
            Some(format!("Message #0 for topic purchase/tickets/{}", i).as_str())
        );
    }
    assert_eq!(fixture.depths(), vec![2; 5]);
}

#[test]
fn iteration_pulls_from_all_queues_or_none() {
    let fixture = Fixture::with_queues(3);
    fixture
        .messaging
        .publish_strings(&fixture.topics[0], ["a0", "a1"])
        .unwrap();
    fixture
        .messaging
        .publish_strings(&fixture.topics[1], ["b0", "b1"])
        .unwrap();
    fixture
        .messaging
        .publish_strings(&fixture.topics[2], ["c0"])
        .unwrap();

    let report = fixture
        .messaging
        .receive_from_queues(&fixture.queues, 5)
        .unwrap();

    assert_eq!(report.committed_iterations(), 1);
    assert_eq!(report.starved(), Some(&fixture.queues[2]));
    assert_eq!(fixture.depths(), vec![1, 1, 0]);

    // the rolled-back receives are first in line for the next consumer
    let heads: Vec<_> = ["Q/tickets/0", "Q/tickets/1"]
        .iter()
        .map(|q| fixture.broker.queue_messages(q).unwrap().remove(0))
        .collect();
    assert_eq!(heads[0].payload_str(), Some("a1"));
    assert_eq!(heads[1].payload_str(), Some("b1"));
    assert!(heads.iter().all(|m| m.redelivered));
}

#[test]
fn rolled_back_iteration_leaves_messages_for_the_next() {
    let fixture = Fixture::with_queues(2);
    fixture.messaging.publish_to_topics(&fixture.topics, 1).unwrap();

    fixture.broker.fail_next_commit(CommitFault::RollBack).unwrap();
    let report = fixture
        .messaging
        .receive_from_queues(&fixture.queues, 2)
        .unwrap();

    assert!(matches!(report.iterations[0], IterationOutcome::RolledBack { .. }));
    assert_eq!(report.iterations[1], IterationOutcome::Committed { received: 2 });
    assert!(report.messages.iter().all(|m| m.redelivered));
    assert_eq!(fixture.depths(), vec![0, 0]);
}

#[test]
fn missing_queue_aborts_before_consuming() {
    let fixture = Fixture::with_queues(2);
    fixture.messaging.publish_to_topics(&fixture.topics, 1).unwrap();

    let mut queues = fixture.queues.clone();
    queues.push(Queue::durable_exclusive("Q/absent"));
    let err = fixture.messaging.receive_from_queues(&queues, 1).unwrap_err();

    assert!(err.is_resource_error());
    assert_eq!(fixture.depths(), vec![1, 1]);
}

#[test]
fn queue_shut_down_midway_keeps_committed_iterations() {
    let fixture = Fixture::with_queues(2);
    fixture
        .messaging
        .publish_strings(&fixture.topics[0], ["a0", "a1"])
        .unwrap();
    fixture
        .messaging
        .publish_strings(&fixture.topics[1], ["b0"])
        .unwrap();

    // the second iteration waits on the empty Q/tickets/1 until it is shut down
    let messaging = TransactionalMessaging::new(fixture.service().clone()).with_receive_timeout(1000);
    let broker = fixture.broker.clone();
    let admin = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        broker.shutdown_queue("Q/tickets/1").unwrap();
    });
    let report = messaging.receive_from_queues(&fixture.queues, 2).unwrap();
    admin.join().unwrap();

    assert_eq!(report.iterations, vec![IterationOutcome::Committed { received: 2 }]);
    let bodies: Vec<_> = report.messages.iter().map(|m| m.payload_str().unwrap()).collect();
    assert_eq!(bodies, vec!["a0", "b0"]);
    assert_eq!(
        report.aborted,
        Some(MessagingError::QueueShutdown("Q/tickets/1".into()))
    );
    // a1 was taken in the aborted iteration and went back on close
    let remaining = fixture.broker.queue_messages("Q/tickets/0").unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].payload_str(), Some("a1"));
}
