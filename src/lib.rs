pub mod capability;
pub mod config;
pub mod connection;
mod error;
pub mod in_memory;
pub mod logging;
pub mod message;
#[cfg(feature = "semp")]
pub mod semp;
pub mod transaction;

pub use capability::{
    AccessType, MessagingService, Outcome, PersistentPublisher, PersistentReceiver, QueueAdmin,
    QueueSpec, TransactionalPublisher, TransactionalReceiver, TransactionalSession,
};
pub use config::{AuthScheme, PropertiesFile, SempConfig, ServiceConfig, TlsConfig};
pub use connection::{LifecycleEvents, Reconnector, RetryStrategy, ServiceEvent, ServiceEventKind};
pub use error::{ConfigError, MessagingError, TransactionError};
pub use in_memory::{CommitFault, InMemoryBroker, InMemoryMessagingService, InMemorySession};
pub use logging::LogConfig;
pub use message::{Message, Queue, Topic, TopicSubscription};
pub use transaction::{
    BatchPublish, CommitOutcome, ConsumeReport, DispatchContext, DispatchStats, IterationOutcome,
    PublishReport, TopicOutcome, TransactionalDispatcher, TransactionalMessaging,
};

#[cfg(feature = "semp")]
pub use semp::{SempClient, SempError};

// Re-export the EventEmitter so listeners can be typed against it
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
