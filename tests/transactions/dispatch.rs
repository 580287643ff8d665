use std::thread;
use std::time::{Duration, Instant};

use pubsub_rust::{
    CommitFault, Message, MessagingError, MessagingService, PersistentPublisher,
    TransactionalDispatcher, TransactionalSession,
};

use crate::support::Fixture;

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

#[test]
fn dispatcher_owns_its_session() {
    let fixture = Fixture::with_queues(1);
    let session = fixture.service().open_transactional_session().unwrap();
    let handle = session.clone();

    let dispatcher = TransactionalDispatcher::spawn(
        session,
        fixture.queues[0].clone(),
        |ctx, _message| ctx.commit().map(|_| ()),
        Duration::from_millis(5),
    )
    .unwrap();

    assert!(matches!(
        handle.commit(),
        Err(MessagingError::NotSessionOwner { .. })
    ));
    assert!(matches!(
        handle.rollback(),
        Err(MessagingError::NotSessionOwner { .. })
    ));

    // the main thread uses a second session in the meantime
    let outcome = fixture
        .messaging
        .publish_one(&fixture.topics[0], Message::with_string_payload("from main"))
        .unwrap();
    assert!(outcome.is_committed());

    assert!(wait_until(|| fixture.broker.queue_depth("Q/tickets/0").unwrap() == 0));
    let stats = dispatcher.stop();
    assert_eq!(stats.messages_handled, 1);
    assert_eq!(stats.commits, 1);
}

#[test]
fn dispatcher_counts_commit_outcomes() {
    let fixture = Fixture::with_queues(2);
    let session = fixture.service().open_transactional_session().unwrap();
    let forward_to = fixture.topics[1].clone();

    let dispatcher = TransactionalDispatcher::spawn(
        session,
        fixture.queues[0].clone(),
        move |ctx, message| {
            ctx.publish(message, &forward_to)?;
            ctx.commit().map(|_| ())
        },
        Duration::from_millis(5),
    )
    .unwrap();

    fixture.broker.fail_next_commit(CommitFault::RollBack).unwrap();
    let publisher = fixture.service().create_persistent_publisher().unwrap();
    publisher
        .publish(Message::with_string_payload("hop"), &fixture.topics[0])
        .unwrap();

    // rolled back once, redelivered, then forwarded
    assert!(wait_until(|| fixture.broker.queue_depth("Q/tickets/1").unwrap() == 1));
    let stats = dispatcher.stop();

    assert_eq!(stats.rollbacks, 1);
    assert_eq!(stats.commits, 1);
    assert_eq!(stats.messages_handled, 2);
    let forwarded = fixture.broker.queue_messages("Q/tickets/1").unwrap();
    assert_eq!(forwarded[0].payload_str(), Some("hop"));
    assert!(!forwarded[0].redelivered);
}
