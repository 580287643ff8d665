use pubsub_rust::{CommitFault, Message, MessagingError, Topic};

use crate::support::Fixture;

#[test]
fn committed_batch_is_visible_once_in_full() {
    let fixture = Fixture::with_queues(1);
    let batch = fixture
        .messaging
        .publish_strings(&fixture.topics[0], ["a", "b", "c"])
        .unwrap();

    assert!(batch.outcome.is_committed());
    let queued = fixture.broker.queue_messages("Q/tickets/0").unwrap();
    let bodies: Vec<_> = queued.iter().map(|m| m.payload_str().unwrap()).collect();
    assert_eq!(bodies, vec!["a", "b", "c"]);
    assert!(queued.iter().all(|m| !m.redelivered));
}

#[test]
fn retry_after_rollback_does_not_duplicate_earlier_batches() {
    let fixture = Fixture::with_queues(1);
    let topic = &fixture.topics[0];

    let first = fixture.messaging.publish_strings(topic, ["1", "2"]).unwrap();
    assert!(first.outcome.is_committed());

    fixture.broker.fail_next_commit(CommitFault::RollBack).unwrap();
    let second = fixture.messaging.publish_strings(topic, ["3", "4"]).unwrap();
    assert!(second.outcome.is_safe_to_retry());

    let retried = fixture.messaging.publish_strings(topic, ["3", "4"]).unwrap();
    assert!(retried.outcome.is_committed());

    let bodies: Vec<_> = fixture
        .broker
        .queue_messages("Q/tickets/0")
        .unwrap()
        .iter()
        .map(|m| m.payload_str().unwrap().to_string())
        .collect();
    assert_eq!(bodies, vec!["1", "2", "3", "4"]);
}

#[test]
fn unknown_outcome_is_never_reported_as_committed() {
    let fixture = Fixture::with_queues(1);
    let topic = &fixture.topics[0];

    for fault in [CommitFault::UnknownApplied, CommitFault::UnknownDiscarded] {
        fixture.broker.fail_next_commit(fault).unwrap();
        let batch = fixture.messaging.publish_strings(topic, ["x"]).unwrap();
        assert!(batch.outcome.is_unknown());
        assert!(!batch.outcome.is_committed());
        assert!(!batch.outcome.is_safe_to_retry());
        assert!(batch.delivered.is_empty());
    }
    // only the applied one landed
    assert_eq!(fixture.broker.queue_depth("Q/tickets/0").unwrap(), 1);
}

#[test]
fn interrupted_broker_refuses_new_transactions() {
    let fixture = Fixture::with_queues(1);
    let topic = fixture.topics[0].clone();

    fixture.broker.interrupt("link down").unwrap();
    let err = fixture
        .messaging
        .publish_one(&topic, Message::with_string_payload("lost"))
        .unwrap_err();
    assert_eq!(err, MessagingError::NotConnected);

    fixture.broker.restore().unwrap();
    let outcome = fixture
        .messaging
        .publish_one(&topic, Message::with_string_payload("kept"))
        .unwrap();
    assert!(outcome.is_committed());
}

#[test]
fn publish_to_topics_reports_per_topic_outcomes() {
    let fixture = Fixture::with_queues(3);
    fixture.broker.fail_next_commit(CommitFault::RollBack).unwrap();
    fixture.broker.fail_next_commit(CommitFault::UnknownDiscarded).unwrap();

    let report = fixture.messaging.publish_to_topics(&fixture.topics, 2).unwrap();

    assert!(report.outcomes[0].outcome.is_rolled_back());
    assert!(report.outcomes[1].outcome.is_unknown());
    assert!(report.outcomes[2].outcome.is_committed());
    assert_eq!(report.unknown_topics(), vec![&fixture.topics[1]]);
    assert_eq!(fixture.depths(), vec![0, 0, 2]);
}

#[test]
fn structured_payloads_survive_the_broker() {
    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Ticket {
        seat: String,
        price_cents: u32,
    }

    let fixture = Fixture::with_queues(1);
    let ticket = Ticket {
        seat: "A12".into(),
        price_cents: 4500,
    };
    let message = Message::json_encode(&ticket)
        .unwrap()
        .with_property("kind", "ticket")
        .with_application_message_id("order-1");

    let outcome = fixture
        .messaging
        .publish_one(&fixture.topics[0], message)
        .unwrap();
    assert!(outcome.is_committed());

    let queued = fixture.broker.queue_messages("Q/tickets/0").unwrap();
    assert_eq!(queued[0].json_decode::<Ticket>().unwrap(), ticket);
    assert_eq!(queued[0].property("kind"), Some("ticket"));
    assert_eq!(queued[0].application_message_id.as_deref(), Some("order-1"));
    assert_eq!(queued[0].destination.as_deref(), Some("purchase/tickets/0"));
}

#[test]
fn invalid_topic_is_a_resource_error() {
    let fixture = Fixture::with_queues(1);
    let err = fixture
        .messaging
        .publish_strings(&Topic::of("purchase//tickets"), ["x"])
        .unwrap_err();
    assert!(err.is_resource_error());
}
