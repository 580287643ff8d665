use thiserror::Error;

/// Failure of a transaction commit, as reported by the broker.
///
/// The two variants must never be merged: `RolledBack` means nothing from the
/// transaction was applied and the unit may be retried, `Unknown` means the
/// acknowledgement exchange failed and the broker may or may not have applied
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("transaction rolled back: {0}")]
    RolledBack(String),
    #[error("transaction outcome unknown: {0}")]
    Unknown(String),
}

/// Error type for messaging operations against a broker capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagingError {
    #[error("messaging service is not connected")]
    NotConnected,
    #[error("queue not found: {0}")]
    QueueNotFound(String),
    #[error("queue already exists: {0}")]
    QueueExists(String),
    #[error("queue {0} is shut down")]
    QueueShutdown(String),
    #[error("authentication failed for user {0}")]
    AuthenticationFailed(String),
    #[error("session {0} is closed")]
    SessionClosed(String),
    #[error("session {session} is owned by another thread")]
    NotSessionOwner { session: String },
    #[error("invalid topic: {0}")]
    InvalidTopic(String),
    #[error("payload error: {0}")]
    Payload(String),
    #[error("lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error("{0}")]
    Other(String),
}

impl MessagingError {
    /// Resource errors abort the unit of work and retire the session.
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self,
            MessagingError::QueueNotFound(_)
                | MessagingError::QueueShutdown(_)
                | MessagingError::InvalidTopic(_)
                | MessagingError::AuthenticationFailed(_)
        )
    }
}

impl From<bitcode::Error> for MessagingError {
    fn from(err: bitcode::Error) -> Self {
        MessagingError::Payload(err.to_string())
    }
}

impl From<serde_json::Error> for MessagingError {
    fn from(err: serde_json::Error) -> Self {
        MessagingError::Payload(err.to_string())
    }
}

/// Error loading broker properties.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read properties file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse properties: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing property: {0}")]
    Missing(&'static str),
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
}
