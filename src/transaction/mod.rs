//! Transactional publish and consume helpers.
//!
//! [`TransactionalMessaging`] sequences work against any
//! [`crate::MessagingService`]:
//!
//! - `publish_batch`: all messages of a batch reach a topic, or none do
//! - `publish_to_topics`: one transaction per topic on a shared session
//! - `receive_from_queues`: take one message from every queue per
//!   transaction, or none at all
//!
//! Commit results are reported as [`CommitOutcome`]. An `Unknown` outcome is
//! never treated as committed and never retried automatically, since a
//! retry could deliver the batch twice.
//!
//! [`TransactionalDispatcher`] runs a session in callback mode on a
//! dedicated thread, the only thread allowed to touch that session.
//!
//! ```
//! use pubsub_rust::{
//!     InMemoryBroker, MessagingService, Queue, QueueAdmin, QueueSpec, ServiceConfig, Topic,
//!     TransactionalMessaging,
//! };
//!
//! let broker = InMemoryBroker::new();
//! broker.create_queue(&QueueSpec::exclusive("Q/orders")).unwrap();
//! broker.add_subscription("Q/orders", "orders").unwrap();
//!
//! let service = broker.messaging_service(ServiceConfig::new("tcp://localhost", "default"));
//! service.connect().unwrap();
//!
//! let messaging = TransactionalMessaging::new(service).with_receive_timeout(10);
//! let batch = messaging
//!     .publish_strings(&Topic::of("orders"), ["a", "b", "c"])
//!     .unwrap();
//! assert!(batch.outcome.is_committed());
//! assert_eq!(batch.delivered.len(), 3);
//!
//! let report = messaging
//!     .receive_from_queues(&[Queue::durable_exclusive("Q/orders")], 3)
//!     .unwrap();
//! assert_eq!(report.messages.len(), 3);
//! ```

mod consume;
mod dispatch;
mod messaging;
mod outcome;
mod publish;

pub use consume::{ConsumeReport, IterationOutcome};
pub use dispatch::{DispatchContext, DispatchStats, TransactionalDispatcher};
pub use messaging::TransactionalMessaging;
pub use outcome::CommitOutcome;
pub use publish::{BatchPublish, PublishReport, TopicOutcome};
