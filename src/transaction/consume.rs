use crate::capability::{MessagingService, TransactionalReceiver, TransactionalSession};
use crate::error::MessagingError;
use crate::message::{Message, Queue};

use super::messaging::TransactionalMessaging;
use super::outcome::CommitOutcome;

/// What happened in one iteration of [`TransactionalMessaging::receive_from_queues`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    /// One message from every queue was consumed.
    Committed { received: usize },
    /// The commit was rolled back; the messages stay on their queues.
    RolledBack { reason: String },
    /// The commit outcome is indeterminate; the messages may or may not
    /// have been consumed.
    Unknown { reason: String },
    /// `queue` had no message within the receive timeout. The `discarded`
    /// messages already taken from earlier queues were rolled back and the
    /// loop stopped.
    Starved { queue: Queue, discarded: usize },
}

/// Result of [`TransactionalMessaging::receive_from_queues`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumeReport {
    /// Messages from committed iterations, iteration by iteration, in queue
    /// order within each iteration.
    pub messages: Vec<Message>,
    pub iterations: Vec<IterationOutcome>,
    /// Error that stopped the loop partway. Iterations listed before it
    /// keep their outcome; the interrupted one consumed nothing.
    pub aborted: Option<MessagingError>,
}

impl ConsumeReport {
    pub fn committed_iterations(&self) -> usize {
        self.iterations
            .iter()
            .filter(|i| matches!(i, IterationOutcome::Committed { .. }))
            .count()
    }

    pub fn starved(&self) -> Option<&Queue> {
        self.iterations.iter().find_map(|i| match i {
            IterationOutcome::Starved { queue, .. } => Some(queue),
            _ => None,
        })
    }
}

impl<S: MessagingService> TransactionalMessaging<S> {
    /// Take one message from every queue in a single transaction, `count`
    /// times.
    ///
    /// An iteration consumes from all queues or from none: when a queue has
    /// nothing within the receive timeout, whatever was already taken in that
    /// iteration is rolled back and no further iterations run. Rolled-back
    /// and unknown commits contribute no messages but do not stop the loop.
    ///
    /// Failing to set up the receivers returns `Err`. An error in a later
    /// iteration stops the loop and is recorded in
    /// [`ConsumeReport::aborted`], next to the iterations that already
    /// committed.
    ///
    /// An empty queue list does no work and opens no session.
    pub fn receive_from_queues(&self, queues: &[Queue], count: usize) -> Result<ConsumeReport, MessagingError> {
        if queues.is_empty() || count == 0 {
            return Ok(ConsumeReport::default());
        }

        self.with_session(|session| {
            let receivers = queues
                .iter()
                .map(|queue| session.create_receiver(queue))
                .collect::<Result<Vec<_>, _>>()?;
            let mut report = ConsumeReport::default();

            for iteration in 0..count {
                match consume_iteration(session, queues, &receivers, self.receive_timeout_ms, iteration, &mut report) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(err) => {
                        tracing::warn!(
                            session = session.id(),
                            iteration = iteration,
                            committed = report.committed_iterations(),
                            error = %err,
                            "consume aborted"
                        );
                        report.aborted = Some(err);
                        break;
                    }
                }
            }
            Ok(report)
        })
    }
}

/// Run one iteration and record its outcome. Returns `false` when the loop
/// must stop.
fn consume_iteration<T: TransactionalSession>(
    session: &T,
    queues: &[Queue],
    receivers: &[T::Receiver],
    timeout_ms: u64,
    iteration: usize,
    report: &mut ConsumeReport,
) -> Result<bool, MessagingError> {
    let mut batch = Vec::with_capacity(receivers.len());

    for (queue, receiver) in queues.iter().zip(receivers) {
        if let Some(message) = receiver.receive_message(timeout_ms)? {
            batch.push(message);
            continue;
        }

        if !batch.is_empty() {
            session.rollback()?;
        }
        tracing::info!(
            session = session.id(),
            iteration = iteration,
            queue = %queue,
            discarded = batch.len(),
            "queue ran empty, stopping"
        );
        report.iterations.push(IterationOutcome::Starved {
            queue: queue.clone(),
            discarded: batch.len(),
        });
        return Ok(false);
    }

    match CommitOutcome::from_commit(session.commit())? {
        CommitOutcome::Committed => {
            tracing::debug!(session = session.id(), iteration = iteration, received = batch.len(), "iteration committed");
            report.iterations.push(IterationOutcome::Committed {
                received: batch.len(),
            });
            report.messages.extend(batch);
        }
        CommitOutcome::RolledBack(reason) => {
            tracing::warn!(session = session.id(), iteration = iteration, reason = %reason, "iteration rolled back");
            report.iterations.push(IterationOutcome::RolledBack { reason });
        }
        CommitOutcome::Unknown(reason) => {
            tracing::error!(session = session.id(), iteration = iteration, reason = %reason, "iteration outcome unknown");
            report.iterations.push(IterationOutcome::Unknown { reason });
        }
    }
    Ok(true)
}
