use thiserror::Error;

/// Error type for SEMP management requests.
#[derive(Debug, Error)]
pub enum SempError {
    /// The request never produced an HTTP response.
    #[error("SEMP transport error: {0}")]
    Http(#[from] reqwest::Error),
    /// The broker answered with a non-success status.
    #[error("SEMP request failed with status {status}: {description}")]
    Api {
        status: u16,
        description: String,
        /// SEMP error status such as `ALREADY_EXISTS` or `NOT_FOUND`.
        error_status: Option<String>,
    },
    #[error("invalid SEMP url: {0}")]
    InvalidUrl(String),
    #[error("unexpected SEMP response: {0}")]
    Decode(String),
}

impl SempError {
    /// SEMP error status of an API failure, if any.
    pub fn error_status(&self) -> Option<&str> {
        match self {
            SempError::Api { error_status, .. } => error_status.as_deref(),
            _ => None,
        }
    }

    pub fn is_already_exists(&self) -> bool {
        self.error_status() == Some("ALREADY_EXISTS")
    }

    pub fn is_not_found(&self) -> bool {
        self.error_status() == Some("NOT_FOUND")
    }
}
