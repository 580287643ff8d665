use std::fmt;

use crate::error::{MessagingError, TransactionError};

/// Result of a commit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// Nothing was applied; the unit can be retried.
    RolledBack(String),
    /// The broker may or may not have applied the transaction.
    Unknown(String),
}

impl CommitOutcome {
    /// Classify the result of [`crate::TransactionalSession::commit`].
    ///
    /// Rolled-back and unknown outcomes become values; every other error is
    /// returned unchanged.
    pub fn from_commit(result: Result<(), MessagingError>) -> Result<Self, MessagingError> {
        match result {
            Ok(()) => Ok(CommitOutcome::Committed),
            Err(MessagingError::Transaction(TransactionError::RolledBack(reason))) => {
                Ok(CommitOutcome::RolledBack(reason))
            }
            Err(MessagingError::Transaction(TransactionError::Unknown(reason))) => {
                Ok(CommitOutcome::Unknown(reason))
            }
            Err(err) => Err(err),
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed)
    }

    pub fn is_rolled_back(&self) -> bool {
        matches!(self, CommitOutcome::RolledBack(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, CommitOutcome::Unknown(_))
    }

    /// Only a definite rollback is safe to retry.
    pub fn is_safe_to_retry(&self) -> bool {
        self.is_rolled_back()
    }
}

impl fmt::Display for CommitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitOutcome::Committed => write!(f, "committed"),
            CommitOutcome::RolledBack(reason) => write!(f, "rolled back: {}", reason),
            CommitOutcome::Unknown(reason) => write!(f, "unknown: {}", reason),
        }
    }
}
