use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::capability::{QueueAdmin, QueueSpec};
use crate::config::{AuthScheme, ServiceConfig};
use crate::connection::{LifecycleEvents, ServiceEvent};
use crate::error::MessagingError;
use crate::message::{Message, TopicSubscription};

use super::service::InMemoryMessagingService;

/// Forced result for the next commit on any session of the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitFault {
    /// The broker rolls the transaction back.
    RollBack,
    /// The transaction is applied but the acknowledgement is lost.
    UnknownApplied,
    /// The transaction is discarded and the acknowledgement is lost.
    UnknownDiscarded,
}

#[derive(Debug)]
pub(crate) struct QueueState {
    pub(crate) spec: QueueSpec,
    pub(crate) subscriptions: Vec<TopicSubscription>,
    pub(crate) spool: VecDeque<Message>,
    /// Delivered to a persistent receiver, awaiting settlement.
    pub(crate) unsettled: Vec<Message>,
}

impl QueueState {
    fn new(spec: QueueSpec) -> Self {
        Self {
            spec,
            subscriptions: Vec::new(),
            spool: VecDeque::new(),
            unsettled: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct BrokerState {
    pub(crate) interrupted: bool,
    pub(crate) users: BTreeMap<String, String>,
    pub(crate) queues: BTreeMap<String, QueueState>,
    pub(crate) dead_messages: Vec<Message>,
    pub(crate) commit_faults: VecDeque<CommitFault>,
    pub(crate) next_session: u64,
}

impl BrokerState {
    /// Spool a message on every queue with a matching subscription.
    /// Returns how many queues received a copy.
    pub(crate) fn route(&mut self, message: &Message) -> usize {
        let Some(topic) = message.destination.as_deref() else {
            return 0;
        };
        let mut delivered = 0;
        for queue in self.queues.values_mut() {
            if !queue.spec.ingress_enabled {
                continue;
            }
            if queue.subscriptions.iter().any(|sub| sub.matches(topic)) {
                queue.spool.push_back(message.clone());
                delivered += 1;
            }
        }
        delivered
    }

    pub(crate) fn queue_mut(&mut self, name: &str) -> Result<&mut QueueState, MessagingError> {
        self.queues
            .get_mut(name)
            .ok_or_else(|| MessagingError::QueueNotFound(name.to_string()))
    }

    /// Take the next message from a queue for delivery.
    pub(crate) fn take_next(&mut self, name: &str) -> Result<Option<Message>, MessagingError> {
        let queue = self.queue_mut(name)?;
        if !queue.spec.egress_enabled {
            return Err(MessagingError::QueueShutdown(name.to_string()));
        }
        Ok(queue.spool.pop_front())
    }

    /// Put a message back at the head of its queue, flagged as redelivered.
    /// Messages whose queue no longer exists go to the dead message list.
    pub(crate) fn return_to_queue(&mut self, name: &str, mut message: Message) {
        message.redelivered = true;
        match self.queues.get_mut(name) {
            Some(queue) => queue.spool.push_front(message),
            None => self.dead_messages.push(message),
        }
    }

    fn authenticate(&self, config: &ServiceConfig) -> Result<(), MessagingError> {
        if self.users.is_empty() {
            return Ok(());
        }
        match &config.authentication {
            AuthScheme::Basic { username, password } => match self.users.get(username) {
                Some(expected) if expected == password => Ok(()),
                _ => Err(MessagingError::AuthenticationFailed(username.clone())),
            },
            AuthScheme::ClientCertificate { username, .. } => {
                let username = username.clone().unwrap_or_default();
                if self.users.contains_key(&username) {
                    Ok(())
                } else {
                    Err(MessagingError::AuthenticationFailed(username))
                }
            }
        }
    }
}

/// In-process broker implementing every capability trait.
///
/// Cloning is cheap; clones share state. Intended for tests and
/// single-process use:
/// - topic subscriptions route published messages into queues
/// - transactional sessions stage publishes and receives until commit
/// - commit outcomes can be forced with [`fail_next_commit`](Self::fail_next_commit)
/// - connectivity can be dropped with [`interrupt`](Self::interrupt)
///
/// ```
/// use pubsub_rust::{InMemoryBroker, MessagingService, QueueAdmin, QueueSpec, ServiceConfig};
///
/// let broker = InMemoryBroker::new();
/// broker.create_queue(&QueueSpec::exclusive("Q/orders")).unwrap();
/// broker.add_subscription("Q/orders", "orders/>").unwrap();
///
/// let service = broker.messaging_service(ServiceConfig::new("tcp://localhost", "default"));
/// service.connect().unwrap();
/// assert!(service.is_connected());
/// ```
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    pub(crate) state: Arc<Mutex<BrokerState>>,
    events: LifecycleEvents,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require basic authentication with these credentials. A broker with no
    /// registered users accepts any client.
    pub fn with_user(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.users.insert(username.into(), password.into());
        }
        self
    }

    /// Create a client for this broker. The client is not connected yet.
    pub fn messaging_service(&self, config: ServiceConfig) -> InMemoryMessagingService {
        InMemoryMessagingService::new(self.clone(), config)
    }

    /// Lifecycle notifications shared by every client of this broker.
    pub fn lifecycle(&self) -> &LifecycleEvents {
        &self.events
    }

    /// Force the outcome of the next commit. Faults queue up and are
    /// consumed one per commit.
    pub fn fail_next_commit(&self, fault: CommitFault) -> Result<(), MessagingError> {
        self.lock("fail_next_commit")?.commit_faults.push_back(fault);
        Ok(())
    }

    /// Drop connectivity for every client. Commits in progress resolve as
    /// unknown and are discarded by the broker.
    pub fn interrupt(&self, cause: &str) -> Result<(), MessagingError> {
        self.lock("interrupt")?.interrupted = true;
        self.events.emit(ServiceEvent::Interrupted {
            cause: cause.to_string(),
        });
        Ok(())
    }

    /// Accept connections again after [`interrupt`](Self::interrupt).
    pub fn restore(&self) -> Result<(), MessagingError> {
        self.lock("restore")?.interrupted = false;
        tracing::info!("broker connectivity restored");
        Ok(())
    }

    pub fn is_interrupted(&self) -> bool {
        self.state.lock().map(|s| s.interrupted).unwrap_or(true)
    }

    /// Number of messages waiting in a queue.
    pub fn queue_depth(&self, name: &str) -> Result<usize, MessagingError> {
        Ok(self.lock("queue_depth")?.queue_mut(name)?.spool.len())
    }

    /// Snapshot of the messages waiting in a queue, head first.
    pub fn queue_messages(&self, name: &str) -> Result<Vec<Message>, MessagingError> {
        Ok(self
            .lock("queue_messages")?
            .queue_mut(name)?
            .spool
            .iter()
            .cloned()
            .collect())
    }

    pub fn subscriptions(&self, queue: &str) -> Result<Vec<TopicSubscription>, MessagingError> {
        Ok(self.lock("subscriptions")?.queue_mut(queue)?.subscriptions.clone())
    }

    pub fn queue_names(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.queues.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Messages rejected by receivers or orphaned by a deleted queue.
    pub fn dead_messages(&self) -> Vec<Message> {
        self.state
            .lock()
            .map(|s| s.dead_messages.clone())
            .unwrap_or_default()
    }

    pub(crate) fn lock(
        &self,
        operation: &'static str,
    ) -> Result<MutexGuard<'_, BrokerState>, MessagingError> {
        self.state
            .lock()
            .map_err(|_| MessagingError::LockPoisoned(operation))
    }

    pub(crate) fn authenticate(&self, config: &ServiceConfig) -> Result<(), MessagingError> {
        let state = self.lock("connect")?;
        if state.interrupted {
            return Err(MessagingError::NotConnected);
        }
        state.authenticate(config)
    }

    pub(crate) fn next_session_id(&self) -> Result<String, MessagingError> {
        let mut state = self.lock("open_session")?;
        state.next_session += 1;
        Ok(format!("txn-session-{}", state.next_session))
    }
}

impl QueueAdmin for InMemoryBroker {
    type Error = MessagingError;

    fn create_queue(&self, spec: &QueueSpec) -> Result<(), Self::Error> {
        let mut state = self.lock("create_queue")?;
        if state.queues.contains_key(&spec.name) {
            if !spec.delete_if_exists {
                return Err(MessagingError::QueueExists(spec.name.clone()));
            }
            if let Some(old) = state.queues.remove(&spec.name) {
                state.dead_messages.extend(old.spool);
                state.dead_messages.extend(old.unsettled);
            }
        }
        tracing::debug!(queue = %spec.name, access = spec.access_type.as_str(), "queue created");
        state
            .queues
            .insert(spec.name.clone(), QueueState::new(spec.clone()));
        Ok(())
    }

    fn delete_queue(&self, name: &str) -> Result<(), Self::Error> {
        let mut state = self.lock("delete_queue")?;
        let queue = state
            .queues
            .remove(name)
            .ok_or_else(|| MessagingError::QueueNotFound(name.to_string()))?;
        state.dead_messages.extend(queue.spool);
        state.dead_messages.extend(queue.unsettled);
        tracing::debug!(queue = %name, "queue deleted");
        Ok(())
    }

    fn add_subscription(&self, queue: &str, topic: &str) -> Result<(), Self::Error> {
        let mut state = self.lock("add_subscription")?;
        let queue = state.queue_mut(queue)?;
        let subscription = TopicSubscription::of(topic);
        if !queue.subscriptions.contains(&subscription) {
            queue.subscriptions.push(subscription);
        }
        Ok(())
    }

    fn remove_subscription(&self, queue: &str, topic: &str) -> Result<(), Self::Error> {
        let mut state = self.lock("remove_subscription")?;
        let queue = state.queue_mut(queue)?;
        queue.subscriptions.retain(|sub| sub.pattern() != topic);
        Ok(())
    }

    fn shutdown_queue(&self, name: &str) -> Result<(), Self::Error> {
        let mut state = self.lock("shutdown_queue")?;
        let queue = state.queue_mut(name)?;
        queue.spec.ingress_enabled = false;
        queue.spec.egress_enabled = false;
        Ok(())
    }
}
