use crate::error::MessagingError;
use crate::message::{Message, Queue, Topic};

/// One broker-side transaction context.
///
/// A transaction begins implicitly when the session opens and again after
/// every commit or rollback. Work done through the session's publishers and
/// receivers is staged until [`commit`](Self::commit).
///
/// `commit` reports a rolled-back or indeterminate outcome as
/// [`MessagingError::Transaction`]; any other error is a resource or
/// connectivity failure.
///
/// A session must have a single owner at a time. Implementations may enforce
/// this with [`bind_to_current_thread`](Self::bind_to_current_thread).
pub trait TransactionalSession: Send {
    type Publisher: TransactionalPublisher;
    type Receiver: TransactionalReceiver;

    fn id(&self) -> &str;

    fn create_publisher(&self) -> Result<Self::Publisher, MessagingError>;

    fn create_receiver(&self, queue: &Queue) -> Result<Self::Receiver, MessagingError>;

    fn commit(&self) -> Result<(), MessagingError>;

    fn rollback(&self) -> Result<(), MessagingError>;

    /// Close the session, rolling back any uncommitted work.
    fn close(&self) -> Result<(), MessagingError>;

    /// Restrict all further operations to the calling thread.
    ///
    /// The default does nothing; the caller remains responsible for
    /// single-owner access.
    fn bind_to_current_thread(&self) -> Result<(), MessagingError> {
        Ok(())
    }
}

/// Publisher bound to a transactional session.
pub trait TransactionalPublisher {
    /// Stage a message for `topic`. Returns the message as the broker will
    /// deliver it once the transaction commits.
    fn publish(&self, message: Message, topic: &Topic) -> Result<Message, MessagingError>;
}

/// Receiver bound to a transactional session and one queue.
pub trait TransactionalReceiver {
    /// Wait up to `timeout_ms` for the next message. A timeout returns
    /// `Ok(None)` and leaves the current transaction untouched.
    fn receive_message(&self, timeout_ms: u64) -> Result<Option<Message>, MessagingError>;
}
