use crate::capability::{MessagingService, TransactionalSession};
use crate::config::DEFAULT_RECEIVE_TIMEOUT_MS;
use crate::error::MessagingError;

/// Transactional publish/consume helper over a [`MessagingService`].
///
/// Every operation opens its own transactional session and closes it before
/// returning, whether the work succeeded or not. A failed session is never
/// reused.
pub struct TransactionalMessaging<S> {
    pub(crate) service: S,
    pub(crate) receive_timeout_ms: u64,
}

impl<S> TransactionalMessaging<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            receive_timeout_ms: DEFAULT_RECEIVE_TIMEOUT_MS,
        }
    }

    /// Bound on each per-queue wait inside [`receive_from_queues`](Self::receive_from_queues).
    pub fn with_receive_timeout(mut self, timeout_ms: u64) -> Self {
        self.receive_timeout_ms = timeout_ms;
        self
    }

    pub fn receive_timeout_ms(&self) -> u64 {
        self.receive_timeout_ms
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

impl<S: MessagingService> TransactionalMessaging<S> {
    /// Run `work` on a fresh session and close the session afterwards.
    ///
    /// Closing rolls back anything left uncommitted, so an error from `work`
    /// leaves no partial transaction behind.
    pub(crate) fn with_session<T, F>(&self, work: F) -> Result<T, MessagingError>
    where
        F: FnOnce(&S::Session) -> Result<T, MessagingError>,
    {
        let session = self.service.open_transactional_session()?;
        let result = work(&session);

        if let Err(err) = &result {
            tracing::warn!(session = session.id(), error = %err, "aborting unit of work");
        }
        if let Err(err) = session.close() {
            tracing::warn!(session = session.id(), error = %err, "failed to close transactional session");
        }
        result
    }
}
