//! Background dispatch thread owning a transactional session.
//!
//! `TransactionalDispatcher` moves a session into its own thread, binds it
//! there and feeds every message received from one queue to a handler. The
//! handler publishes, commits and rolls back through a [`DispatchContext`];
//! nothing outside the thread can reach the session.

use std::sync::mpsc::{channel, sync_channel, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::capability::{TransactionalPublisher, TransactionalReceiver, TransactionalSession};
use crate::error::MessagingError;
use crate::message::{Message, Queue, Topic};

use super::outcome::CommitOutcome;

/// Statistics from the dispatch thread.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchStats {
    /// Number of messages the handler accepted.
    pub messages_handled: usize,
    /// Number of messages the handler failed on.
    pub messages_failed: usize,
    pub commits: usize,
    pub rollbacks: usize,
    pub unknown_outcomes: usize,
    /// Number of poll cycles completed.
    pub polls: usize,
}

/// Handle on the dispatch thread's session, passed to the handler.
pub struct DispatchContext<'a, S: TransactionalSession> {
    session: &'a S,
    publisher: &'a S::Publisher,
    stats: &'a mut DispatchStats,
}

impl<'a, S: TransactionalSession> DispatchContext<'a, S> {
    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    /// Stage a publish in the current transaction.
    pub fn publish(&self, message: Message, topic: &Topic) -> Result<Message, MessagingError> {
        self.publisher.publish(message, topic)
    }

    /// Commit everything received and published since the last commit or
    /// rollback.
    pub fn commit(&mut self) -> Result<CommitOutcome, MessagingError> {
        let outcome = CommitOutcome::from_commit(self.session.commit())?;
        match &outcome {
            CommitOutcome::Committed => self.stats.commits += 1,
            CommitOutcome::RolledBack(reason) => {
                tracing::warn!(session = self.session.id(), reason = %reason, "dispatch commit rolled back");
                self.stats.rollbacks += 1;
            }
            CommitOutcome::Unknown(reason) => {
                tracing::error!(session = self.session.id(), reason = %reason, "dispatch commit outcome unknown");
                self.stats.unknown_outcomes += 1;
            }
        }
        Ok(outcome)
    }

    pub fn rollback(&mut self) -> Result<(), MessagingError> {
        self.session.rollback()?;
        self.stats.rollbacks += 1;
        Ok(())
    }
}

/// A background thread receiving from one queue inside a transactional
/// session and dispatching each message to a handler, one at a time.
///
/// When the handler returns an error the open transaction is rolled back,
/// so the message goes back to the queue.
///
/// ## Example
///
/// ```
/// use std::time::Duration;
/// use pubsub_rust::{
///     InMemoryBroker, MessagingService, Queue, QueueAdmin, QueueSpec, ServiceConfig,
///     TransactionalDispatcher,
/// };
///
/// let broker = InMemoryBroker::new();
/// broker.create_queue(&QueueSpec::exclusive("Q/orders")).unwrap();
/// let service = broker.messaging_service(ServiceConfig::new("tcp://localhost", "default"));
/// service.connect().unwrap();
///
/// let session = service.open_transactional_session().unwrap();
/// let dispatcher = TransactionalDispatcher::spawn(
///     session,
///     Queue::durable_exclusive("Q/orders"),
///     |ctx, _message| ctx.commit().map(|_| ()),
///     Duration::from_millis(5),
/// )
/// .unwrap();
///
/// let stats = dispatcher.stop();
/// assert_eq!(stats.messages_handled, 0);
/// ```
pub struct TransactionalDispatcher {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<DispatchStats>>,
}

impl TransactionalDispatcher {
    /// Move `session` into a new dispatch thread listening on `queue`.
    ///
    /// Fails if the session cannot be bound or the receiver cannot be
    /// created; the session is closed in that case.
    pub fn spawn<S, F>(
        session: S,
        queue: Queue,
        mut handler: F,
        poll_interval: Duration,
    ) -> Result<Self, MessagingError>
    where
        S: TransactionalSession + 'static,
        F: FnMut(&mut DispatchContext<'_, S>, Message) -> Result<(), MessagingError> + Send + 'static,
    {
        let (stop_tx, stop_rx) = channel();
        let (ready_tx, ready_rx) = sync_channel(1);

        let handle = thread::spawn(move || {
            let mut stats = DispatchStats::default();

            let setup = session.bind_to_current_thread().and_then(|()| {
                let publisher = session.create_publisher()?;
                let receiver = session.create_receiver(&queue)?;
                Ok((publisher, receiver))
            });
            let (publisher, receiver) = match setup {
                Ok(parts) => {
                    let _ = ready_tx.send(Ok(()));
                    parts
                }
                Err(err) => {
                    let _ = session.close();
                    let _ = ready_tx.send(Err(err));
                    return stats;
                }
            };
            tracing::info!(session = session.id(), queue = %queue, "dispatch thread started");

            loop {
                match stop_rx.try_recv() {
                    Ok(()) | Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) => {}
                }

                stats.polls += 1;

                match receiver.receive_message(poll_interval.as_millis() as u64) {
                    Ok(Some(message)) => {
                        let id = message.id.clone();
                        let mut ctx = DispatchContext {
                            session: &session,
                            publisher: &publisher,
                            stats: &mut stats,
                        };
                        match handler(&mut ctx, message) {
                            Ok(()) => stats.messages_handled += 1,
                            Err(err) => {
                                stats.messages_failed += 1;
                                tracing::warn!(session = session.id(), message = %id, error = %err, "handler failed, rolling back");
                                match session.rollback() {
                                    Ok(()) => stats.rollbacks += 1,
                                    Err(err) => {
                                        tracing::warn!(session = session.id(), error = %err, "rollback after handler failure failed")
                                    }
                                }
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(session = session.id(), queue = %queue, error = %err, "dispatch receive failed");
                        thread::sleep(poll_interval);
                    }
                }
            }

            if let Err(err) = session.close() {
                tracing::warn!(session = session.id(), error = %err, "failed to close dispatch session");
            }
            tracing::info!(session = session.id(), handled = stats.messages_handled, "dispatch thread stopped");
            stats
        });

        let ready = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(MessagingError::Other("dispatch thread exited during setup".into())));
        if let Err(err) = ready {
            let _ = handle.join();
            return Err(err);
        }

        Ok(Self {
            stop_tx,
            handle: Some(handle),
        })
    }

    /// Signal the dispatcher to stop and wait for it to finish. The session
    /// is closed, rolling back any uncommitted work.
    pub fn stop(mut self) -> DispatchStats {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap_or_default()
        } else {
            DispatchStats::default()
        }
    }

    /// Signal the dispatcher to stop without waiting.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

impl Drop for TransactionalDispatcher {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}
