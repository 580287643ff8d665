use crate::capability::{MessagingService, TransactionalPublisher, TransactionalSession};
use crate::error::MessagingError;
use crate::message::{Message, Topic};

use super::messaging::TransactionalMessaging;
use super::outcome::CommitOutcome;

/// Result of publishing one batch in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPublish {
    pub outcome: CommitOutcome,
    /// The whole batch when committed, otherwise empty.
    pub delivered: Vec<Message>,
}

/// Outcome of one per-topic transaction inside [`PublishReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicOutcome {
    pub topic: Topic,
    pub outcome: CommitOutcome,
}

/// Result of [`TransactionalMessaging::publish_to_topics`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Messages from committed transactions, in publish order.
    pub delivered: Vec<Message>,
    pub outcomes: Vec<TopicOutcome>,
    /// Topic and error that stopped the run. Its batch was not committed and
    /// no later topic was attempted.
    pub aborted: Option<(Topic, MessagingError)>,
}

impl PublishReport {
    pub fn committed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_committed()).count()
    }

    /// Topics whose outcome is unknown. Re-publishing to these risks
    /// duplicates.
    pub fn unknown_topics(&self) -> Vec<&Topic> {
        self.outcomes
            .iter()
            .filter(|o| o.outcome.is_unknown())
            .map(|o| &o.topic)
            .collect()
    }
}

impl<S: MessagingService> TransactionalMessaging<S> {
    /// Publish `messages` to `topic` as a single transaction.
    ///
    /// Resource errors (invalid topic, lost connection before commit) abort
    /// the batch and are returned as `Err`; the session is closed and
    /// nothing is delivered.
    pub fn publish_batch<I>(&self, topic: &Topic, messages: I) -> Result<BatchPublish, MessagingError>
    where
        I: IntoIterator<Item = Message>,
    {
        self.with_session(|session| {
            let publisher = session.create_publisher()?;
            publish_and_commit(session, &publisher, topic, messages)
        })
    }

    /// [`publish_batch`](Self::publish_batch) with string payloads.
    pub fn publish_strings<I, T>(&self, topic: &Topic, payloads: I) -> Result<BatchPublish, MessagingError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let messages = payloads
            .into_iter()
            .map(|payload| Message::with_string_payload(payload));
        self.publish_batch(topic, messages)
    }

    /// Publish a single message in its own transaction.
    pub fn publish_one(&self, topic: &Topic, message: Message) -> Result<CommitOutcome, MessagingError> {
        Ok(self.publish_batch(topic, [message])?.outcome)
    }

    /// Publish `count` messages to each topic, one transaction per topic, on
    /// a single session.
    ///
    /// A rolled-back or unknown transaction only affects its own topic; later
    /// topics are still attempted. Any other error stops the run and is
    /// recorded in [`PublishReport::aborted`]; outcomes of the topics before
    /// it are kept, so a caller can resume from the aborted topic.
    pub fn publish_to_topics(&self, topics: &[Topic], count: usize) -> Result<PublishReport, MessagingError> {
        self.with_session(|session| {
            let publisher = session.create_publisher()?;
            let mut report = PublishReport::default();

            for topic in topics {
                let messages = (0..count).map(|i| {
                    Message::with_string_payload(format!("Message #{} for topic {}", i, topic.name()))
                });
                let batch = match publish_and_commit(session, &publisher, topic, messages) {
                    Ok(batch) => batch,
                    Err(err) => {
                        tracing::warn!(
                            session = session.id(),
                            topic = %topic,
                            committed = report.committed(),
                            error = %err,
                            "publish aborted"
                        );
                        report.aborted = Some((topic.clone(), err));
                        break;
                    }
                };
                report.delivered.extend(batch.delivered);
                report.outcomes.push(TopicOutcome {
                    topic: topic.clone(),
                    outcome: batch.outcome,
                });
            }
            Ok(report)
        })
    }
}

fn publish_and_commit<T, I>(
    session: &T,
    publisher: &T::Publisher,
    topic: &Topic,
    messages: I,
) -> Result<BatchPublish, MessagingError>
where
    T: TransactionalSession,
    I: IntoIterator<Item = Message>,
{
    let mut staged = Vec::new();
    for message in messages {
        staged.push(publisher.publish(message, topic)?);
    }

    let outcome = CommitOutcome::from_commit(session.commit())?;
    match &outcome {
        CommitOutcome::Committed => {
            tracing::debug!(session = session.id(), topic = %topic, messages = staged.len(), "batch committed");
        }
        CommitOutcome::RolledBack(reason) => {
            tracing::warn!(session = session.id(), topic = %topic, reason = %reason, "batch rolled back");
            staged.clear();
        }
        CommitOutcome::Unknown(reason) => {
            tracing::error!(session = session.id(), topic = %topic, reason = %reason, "batch outcome unknown");
            staged.clear();
        }
    }

    Ok(BatchPublish {
        outcome,
        delivered: staged,
    })
}
