//! Broker messaging capability.
//!
//! These traits describe what the helpers in [`crate::transaction`] need from
//! a broker client: a service that opens transactional sessions, sessions
//! that stage publishes and receives until commit or rollback, plain
//! (non-transactional) persistent publish/receive, and queue administration.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     MessagingService                         │
//! │  connect() / open_transactional_session() / persistent I/O   │
//! └──────────────────────────────────────────────────────────────┘
//!              │                                  │
//!              ▼                                  ▼
//! ┌───────────────────────────┐     ┌───────────────────────────┐
//! │   TransactionalSession    │     │ PersistentPublisher       │
//! │ commit / rollback / close │     │ PersistentReceiver+settle │
//! │  ├─ TransactionalPublisher│     └───────────────────────────┘
//! │  └─ TransactionalReceiver │
//! └───────────────────────────┘
//! ```
//!
//! [`crate::InMemoryBroker`] implements all of them in-process.

mod admin;
mod persistent;
mod session;

pub use admin::{AccessType, QueueAdmin, QueueSpec};
pub use persistent::{Outcome, PersistentPublisher, PersistentReceiver};
pub use session::{TransactionalPublisher, TransactionalReceiver, TransactionalSession};

use crate::error::MessagingError;
use crate::message::Queue;

/// Entry point to a broker: connection control plus factories for sessions,
/// publishers and receivers.
pub trait MessagingService: Send + Sync {
    type Session: TransactionalSession;
    type Publisher: PersistentPublisher;
    type Receiver: PersistentReceiver;

    fn connect(&self) -> Result<(), MessagingError>;

    fn disconnect(&self) -> Result<(), MessagingError>;

    fn is_connected(&self) -> bool;

    /// Open a new transactional session. Each session has exactly one
    /// outstanding transaction at a time.
    fn open_transactional_session(&self) -> Result<Self::Session, MessagingError>;

    fn create_persistent_publisher(&self) -> Result<Self::Publisher, MessagingError>;

    fn create_persistent_receiver(&self, queue: &Queue) -> Result<Self::Receiver, MessagingError>;
}
