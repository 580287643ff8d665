use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use crate::capability::{TransactionalPublisher, TransactionalReceiver, TransactionalSession};
use crate::error::{MessagingError, TransactionError};
use crate::message::{Message, Queue, Topic};

use super::broker::{BrokerState, CommitFault, InMemoryBroker};
use super::service::InMemoryMessagingService;

struct SessionState {
    broker: InMemoryBroker,
    open: bool,
    owner: Option<ThreadId>,
    /// Publishes waiting for commit, in submission order
    staged_publishes: Vec<Message>,
    /// Messages taken off queues in this transaction, in receive order
    staged_receives: Vec<(String, Message)>,
}

/// Dropping the last handle without `close()` hands uncommitted receives
/// back to their queues, as a broker does when the flow unbinds.
impl Drop for SessionState {
    fn drop(&mut self) {
        if self.staged_receives.is_empty() {
            return;
        }
        let broker = self.broker.clone();
        let mut guard = match broker.lock("drop_session") {
            Ok(guard) => guard,
            Err(err) => {
                tracing::warn!(error = %err, "uncommitted receives lost with dropped session");
                return;
            }
        };
        let (_, receives) = InMemorySession::discard(self, &mut guard);
        tracing::debug!(receives = receives, "dropped session returned uncommitted receives");
    }
}

/// Transactional session on an [`super::InMemoryBroker`].
///
/// Publishes are held back until commit and then routed in submission
/// order. Received messages are removed from their queue at once; rollback
/// puts them back at the head of the queue, flagged as redelivered.
///
/// Cloning yields another handle to the same session. Once bound to a thread
/// with [`TransactionalSession::bind_to_current_thread`], every operation
/// from any other thread fails with [`MessagingError::NotSessionOwner`].
#[derive(Clone)]
pub struct InMemorySession {
    id: Arc<str>,
    service: InMemoryMessagingService,
    state: Arc<Mutex<SessionState>>,
}

impl InMemorySession {
    pub(crate) fn new(id: String, service: InMemoryMessagingService) -> Self {
        Self {
            id: id.into(),
            state: Arc::new(Mutex::new(SessionState {
                broker: service.broker().clone(),
                open: true,
                owner: None,
                staged_publishes: Vec::new(),
                staged_receives: Vec::new(),
            })),
            service,
        }
    }

    /// Number of staged publishes and receives in the current transaction.
    pub fn pending(&self) -> Result<(usize, usize), MessagingError> {
        let state = self.lock("pending")?;
        Ok((state.staged_publishes.len(), state.staged_receives.len()))
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().map(|s| s.open).unwrap_or(false)
    }

    fn lock(&self, operation: &'static str) -> Result<MutexGuard<'_, SessionState>, MessagingError> {
        self.state
            .lock()
            .map_err(|_| MessagingError::LockPoisoned(operation))
    }

    /// Lock the session state after checking it is open and owned by the
    /// calling thread.
    fn access(&self, operation: &'static str) -> Result<MutexGuard<'_, SessionState>, MessagingError> {
        let state = self.lock(operation)?;
        if !state.open {
            return Err(MessagingError::SessionClosed(self.id.to_string()));
        }
        if let Some(owner) = state.owner {
            if owner != thread::current().id() {
                tracing::error!(session = %self.id, operation = operation, "session used outside its owning thread");
                return Err(MessagingError::NotSessionOwner {
                    session: self.id.to_string(),
                });
            }
        }
        Ok(state)
    }

    fn discard(state: &mut SessionState, broker: &mut BrokerState) -> (usize, usize) {
        let publishes = state.staged_publishes.len();
        let receives = state.staged_receives.len();
        state.staged_publishes.clear();
        for (queue, message) in state.staged_receives.drain(..).rev() {
            broker.return_to_queue(&queue, message);
        }
        (publishes, receives)
    }

    fn apply(state: &mut SessionState, broker: &mut BrokerState) -> (usize, usize) {
        let publishes = state.staged_publishes.len();
        let receives = state.staged_receives.len();
        for message in state.staged_publishes.drain(..) {
            broker.route(&message);
        }
        state.staged_receives.clear();
        (publishes, receives)
    }
}

impl TransactionalSession for InMemorySession {
    type Publisher = InMemoryTransactionalPublisher;
    type Receiver = InMemoryTransactionalReceiver;

    fn id(&self) -> &str {
        &self.id
    }

    fn create_publisher(&self) -> Result<Self::Publisher, MessagingError> {
        drop(self.access("create_publisher")?);
        self.service.ensure_connected()?;
        Ok(InMemoryTransactionalPublisher {
            session: self.clone(),
        })
    }

    fn create_receiver(&self, queue: &Queue) -> Result<Self::Receiver, MessagingError> {
        drop(self.access("create_receiver")?);
        self.service.ensure_connected()?;
        self.service
            .broker()
            .lock("create_receiver")?
            .queue_mut(queue.name())?;
        Ok(InMemoryTransactionalReceiver {
            session: self.clone(),
            queue: queue.name().to_string(),
        })
    }

    fn commit(&self) -> Result<(), MessagingError> {
        let mut state = self.access("commit")?;
        let mut broker = self.service.broker().lock("commit")?;

        if broker.interrupted {
            Self::discard(&mut state, &mut broker);
            return Err(TransactionError::Unknown("connection lost awaiting commit".into()).into());
        }
        if !self.service.client_connected() {
            Self::discard(&mut state, &mut broker);
            return Err(TransactionError::Unknown("client disconnected awaiting commit".into()).into());
        }

        match broker.commit_faults.pop_front() {
            None => {
                let (publishes, receives) = Self::apply(&mut state, &mut broker);
                tracing::debug!(session = %self.id, publishes = publishes, receives = receives, "commit applied");
                Ok(())
            }
            Some(CommitFault::RollBack) => {
                Self::discard(&mut state, &mut broker);
                Err(TransactionError::RolledBack("broker rolled back the transaction".into()).into())
            }
            Some(CommitFault::UnknownApplied) => {
                Self::apply(&mut state, &mut broker);
                Err(TransactionError::Unknown("commit acknowledgement lost".into()).into())
            }
            Some(CommitFault::UnknownDiscarded) => {
                Self::discard(&mut state, &mut broker);
                Err(TransactionError::Unknown("commit acknowledgement lost".into()).into())
            }
        }
    }

    fn rollback(&self) -> Result<(), MessagingError> {
        let mut state = self.access("rollback")?;
        let mut broker = self.service.broker().lock("rollback")?;
        let (publishes, receives) = Self::discard(&mut state, &mut broker);
        tracing::debug!(session = %self.id, publishes = publishes, receives = receives, "rolled back");
        Ok(())
    }

    fn close(&self) -> Result<(), MessagingError> {
        let mut state = self.access("close")?;
        let mut broker = self.service.broker().lock("close")?;
        Self::discard(&mut state, &mut broker);
        state.open = false;
        tracing::debug!(session = %self.id, "transactional session closed");
        Ok(())
    }

    fn bind_to_current_thread(&self) -> Result<(), MessagingError> {
        let mut state = self.access("bind")?;
        state.owner = Some(thread::current().id());
        Ok(())
    }
}

/// Publisher staging messages on an [`InMemorySession`].
pub struct InMemoryTransactionalPublisher {
    session: InMemorySession,
}

impl TransactionalPublisher for InMemoryTransactionalPublisher {
    fn publish(&self, mut message: Message, topic: &Topic) -> Result<Message, MessagingError> {
        let mut state = self.session.access("publish")?;
        self.session.service.ensure_connected()?;
        topic.validate()?;
        message.destination = Some(topic.name().to_string());
        message.redelivered = false;
        state.staged_publishes.push(message.clone());
        Ok(message)
    }
}

/// Receiver taking messages from one queue into an [`InMemorySession`]'s
/// transaction.
pub struct InMemoryTransactionalReceiver {
    session: InMemorySession,
    queue: String,
}

impl TransactionalReceiver for InMemoryTransactionalReceiver {
    fn receive_message(&self, timeout_ms: u64) -> Result<Option<Message>, MessagingError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);

        loop {
            {
                let mut state = self.session.access("receive")?;
                self.session.service.ensure_connected()?;
                let mut broker = self.session.service.broker().lock("receive")?;
                if let Some(message) = broker.take_next(&self.queue)? {
                    state
                        .staged_receives
                        .push((self.queue.clone(), message.clone()));
                    return Ok(Some(message));
                }
            }

            if Instant::now() >= deadline {
                return Ok(None);
            }

            // Small sleep to avoid busy-waiting
            thread::sleep(Duration::from_millis(1));
        }
    }
}
