//! In-process broker.
//!
//! [`InMemoryBroker`] stands in for a real broker in tests and
//! single-process setups. It implements [`crate::QueueAdmin`] directly and
//! hands out [`InMemoryMessagingService`] clients implementing
//! [`crate::MessagingService`].

mod broker;
mod service;
mod session;

pub use broker::{CommitFault, InMemoryBroker};
pub use service::{InMemoryMessagingService, InMemoryPublisher, InMemoryReceiver};
pub use session::{InMemorySession, InMemoryTransactionalPublisher, InMemoryTransactionalReceiver};
