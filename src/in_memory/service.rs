use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::capability::{MessagingService, Outcome, PersistentPublisher, PersistentReceiver};
use crate::config::ServiceConfig;
use crate::connection::Reconnector;
use crate::error::MessagingError;
use crate::message::{Message, Queue, Topic};

use super::broker::InMemoryBroker;
use super::session::InMemorySession;

/// Client handle to an [`InMemoryBroker`].
///
/// Clones share the connection state.
#[derive(Clone)]
pub struct InMemoryMessagingService {
    broker: InMemoryBroker,
    config: Arc<ServiceConfig>,
    connected: Arc<AtomicBool>,
}

impl InMemoryMessagingService {
    pub(crate) fn new(broker: InMemoryBroker, config: ServiceConfig) -> Self {
        Self {
            broker,
            config: Arc::new(config),
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn broker(&self) -> &InMemoryBroker {
        &self.broker
    }

    /// Connect using the configured reconnection strategy, emitting
    /// lifecycle events for each retry.
    pub fn connect_with_retry(&self) -> Result<(), MessagingError> {
        let reconnector = Reconnector::new(self.config.reconnection, self.broker.lifecycle().clone());
        reconnector.run(|| self.connect())
    }

    /// Client-side connection flag only; does not touch broker state.
    pub(crate) fn client_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Fails unless this client is connected and the broker is reachable.
    pub(crate) fn ensure_connected(&self) -> Result<(), MessagingError> {
        if self.client_connected() && !self.broker.is_interrupted() {
            Ok(())
        } else {
            Err(MessagingError::NotConnected)
        }
    }
}

impl MessagingService for InMemoryMessagingService {
    type Session = InMemorySession;
    type Publisher = InMemoryPublisher;
    type Receiver = InMemoryReceiver;

    fn connect(&self) -> Result<(), MessagingError> {
        self.config
            .validate()
            .map_err(|e| MessagingError::Other(e.to_string()))?;
        self.broker.authenticate(&self.config)?;
        self.connected.store(true, Ordering::SeqCst);
        tracing::info!(host = %self.config.host, vpn = %self.config.vpn_name, "messaging service connected");
        Ok(())
    }

    fn disconnect(&self) -> Result<(), MessagingError> {
        self.connected.store(false, Ordering::SeqCst);
        tracing::info!(host = %self.config.host, "messaging service disconnected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.ensure_connected().is_ok()
    }

    fn open_transactional_session(&self) -> Result<Self::Session, MessagingError> {
        self.ensure_connected()?;
        let id = self.broker.next_session_id()?;
        tracing::debug!(session = %id, "transactional session opened");
        Ok(InMemorySession::new(id, self.clone()))
    }

    fn create_persistent_publisher(&self) -> Result<Self::Publisher, MessagingError> {
        self.ensure_connected()?;
        Ok(InMemoryPublisher {
            service: self.clone(),
        })
    }

    fn create_persistent_receiver(&self, queue: &Queue) -> Result<Self::Receiver, MessagingError> {
        self.ensure_connected()?;
        self.broker.lock("create_receiver")?.queue_mut(queue.name())?;
        Ok(InMemoryReceiver {
            service: self.clone(),
            queue: queue.name().to_string(),
        })
    }
}

/// Non-transactional publisher; messages are routed immediately.
pub struct InMemoryPublisher {
    service: InMemoryMessagingService,
}

impl PersistentPublisher for InMemoryPublisher {
    fn publish(&self, mut message: Message, topic: &Topic) -> Result<Message, MessagingError> {
        self.service.ensure_connected()?;
        topic.validate()?;
        message.destination = Some(topic.name().to_string());
        message.redelivered = false;
        let queues = self.service.broker.lock("publish")?.route(&message);
        tracing::trace!(topic = %topic, queues = queues, "published");
        Ok(message)
    }
}

/// Non-transactional receiver. Delivered messages stay unsettled on the
/// queue until settled.
pub struct InMemoryReceiver {
    service: InMemoryMessagingService,
    queue: String,
}

impl PersistentReceiver for InMemoryReceiver {
    fn receive_message(&self, timeout_ms: u64) -> Result<Option<Message>, MessagingError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);

        loop {
            self.service.ensure_connected()?;
            {
                let mut state = self.service.broker.lock("receive")?;
                if let Some(message) = state.take_next(&self.queue)? {
                    state.queue_mut(&self.queue)?.unsettled.push(message.clone());
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

    fn settle(&self, message: &Message, outcome: Outcome) -> Result<(), MessagingError> {
        self.service.ensure_connected()?;
        let mut state = self.service.broker.lock("settle")?;
        let queue = state.queue_mut(&self.queue)?;
        let position = queue
            .unsettled
            .iter()
            .position(|m| m.id == message.id)
            .ok_or_else(|| {
                MessagingError::Other(format!("message {} is not awaiting settlement", message.id))
            })?;
        let settled = queue.unsettled.remove(position);

        match outcome {
            Outcome::Accepted => {}
            Outcome::Failed => state.return_to_queue(&self.queue, settled),
            Outcome::Rejected => state.dead_messages.push(settled),
        }
        tracing::debug!(queue = %self.queue, message = %message.id, outcome = ?outcome, "settled");
        Ok(())
    }
}
