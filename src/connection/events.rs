use serde::{Deserialize, Serialize};

#[cfg(feature = "emitter")]
use std::sync::{Arc, Mutex};

#[cfg(feature = "emitter")]
use event_emitter_rs::EventEmitter;

/// Notification about the state of a broker connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceEvent {
    /// Connectivity was lost and will not be recovered automatically.
    Interrupted { cause: String },
    /// A reconnection attempt is about to be made.
    Reconnecting { attempt: u32 },
    /// Connectivity was re-established after `attempts` attempts.
    Reconnected { attempts: u32 },
}

/// Event names listeners register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceEventKind {
    Interrupted,
    Reconnecting,
    Reconnected,
}

impl ServiceEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceEventKind::Interrupted => "service.interrupted",
            ServiceEventKind::Reconnecting => "service.reconnecting",
            ServiceEventKind::Reconnected => "service.reconnected",
        }
    }
}

impl ServiceEvent {
    pub fn kind(&self) -> ServiceEventKind {
        match self {
            ServiceEvent::Interrupted { .. } => ServiceEventKind::Interrupted,
            ServiceEvent::Reconnecting { .. } => ServiceEventKind::Reconnecting,
            ServiceEvent::Reconnected { .. } => ServiceEventKind::Reconnected,
        }
    }
}

/// Fan-out of [`ServiceEvent`]s to registered listeners.
///
/// Every event is logged. With the `emitter` feature, listeners registered
/// through `on` are invoked as well; the underlying emitter runs each
/// callback on its own thread, so listeners observe events asynchronously.
#[derive(Clone)]
pub struct LifecycleEvents {
    #[cfg(feature = "emitter")]
    emitter: Arc<Mutex<EventEmitter>>,
}

impl Default for LifecycleEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleEvents {
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "emitter")]
            emitter: Arc::new(Mutex::new(EventEmitter::new())),
        }
    }

    pub fn emit(&self, event: ServiceEvent) {
        match &event {
            ServiceEvent::Interrupted { cause } => {
                tracing::warn!(cause = %cause, "service interrupted")
            }
            ServiceEvent::Reconnecting { attempt } => {
                tracing::info!(attempt = attempt, "reconnecting")
            }
            ServiceEvent::Reconnected { attempts } => {
                tracing::info!(attempts = attempts, "reconnected")
            }
        }

        #[cfg(feature = "emitter")]
        {
            match self.emitter.lock() {
                Ok(mut emitter) => {
                    emitter.emit(event.kind().name(), event);
                }
                Err(_) => tracing::warn!("lifecycle emitter lock poisoned, event dropped"),
            }
        }
    }

    /// Register a listener. Returns an id usable with `remove_listener`.
    #[cfg(feature = "emitter")]
    pub fn on<F>(&self, kind: ServiceEventKind, listener: F) -> Option<String>
    where
        F: Fn(ServiceEvent) + Send + Sync + 'static,
    {
        let mut emitter = self.emitter.lock().ok()?;
        Some(emitter.on(kind.name(), listener))
    }

    #[cfg(feature = "emitter")]
    pub fn remove_listener(&self, id: &str) -> bool {
        match self.emitter.lock() {
            Ok(mut emitter) => emitter.remove_listener(id).is_some(),
            Err(_) => false,
        }
    }
}
