use serde::{Deserialize, Serialize};

use crate::error::MessagingError;
use crate::message::{Message, Topic};

/// Settlement outcome for a message received outside a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Processed; remove from the queue.
    Accepted,
    /// Processing failed; redeliver.
    Failed,
    /// Unprocessable; move to the dead message queue.
    Rejected,
}

/// Non-transactional publisher. Messages are spooled as soon as `publish`
/// returns.
pub trait PersistentPublisher: Send + Sync {
    fn publish(&self, message: Message, topic: &Topic) -> Result<Message, MessagingError>;
}

/// Non-transactional receiver with explicit settlement.
pub trait PersistentReceiver: Send + Sync {
    fn receive_message(&self, timeout_ms: u64) -> Result<Option<Message>, MessagingError>;

    fn settle(&self, message: &Message, outcome: Outcome) -> Result<(), MessagingError>;

    /// Shorthand for settling with [`Outcome::Accepted`].
    fn ack(&self, message: &Message) -> Result<(), MessagingError> {
        self.settle(message, Outcome::Accepted)
    }
}
