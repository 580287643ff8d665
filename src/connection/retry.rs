use std::fmt;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::events::{LifecycleEvents, ServiceEvent};

/// How a connection is re-established after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryStrategy {
    /// A single attempt.
    #[default]
    Never,
    /// Retry until an attempt succeeds.
    Forever { interval_ms: u64 },
    /// Retry up to `retries` times after the first attempt.
    Parametrized { retries: u32, interval_ms: u64 },
}

impl RetryStrategy {
    pub fn never_retry() -> Self {
        RetryStrategy::Never
    }

    pub fn forever_retry(interval_ms: u64) -> Self {
        RetryStrategy::Forever { interval_ms }
    }

    pub fn parametrized_retry(retries: u32, interval_ms: u64) -> Self {
        RetryStrategy::Parametrized {
            retries,
            interval_ms,
        }
    }

    /// Total attempts allowed, `None` when unbounded.
    pub fn max_attempts(&self) -> Option<u32> {
        match self {
            RetryStrategy::Never => Some(1),
            RetryStrategy::Forever { .. } => None,
            RetryStrategy::Parametrized { retries, .. } => Some(retries.saturating_add(1)),
        }
    }

    pub fn interval(&self) -> Duration {
        match self {
            RetryStrategy::Never => Duration::ZERO,
            RetryStrategy::Forever { interval_ms }
            | RetryStrategy::Parametrized { interval_ms, .. } => Duration::from_millis(*interval_ms),
        }
    }
}

/// Drives connection attempts according to a [`RetryStrategy`], reporting
/// progress through [`LifecycleEvents`].
pub struct Reconnector {
    strategy: RetryStrategy,
    events: LifecycleEvents,
}

impl Reconnector {
    pub fn new(strategy: RetryStrategy, events: LifecycleEvents) -> Self {
        Self { strategy, events }
    }

    pub fn strategy(&self) -> RetryStrategy {
        self.strategy
    }

    /// Call `connect` until it succeeds or the strategy is exhausted.
    ///
    /// Every attempt after the first emits `Reconnecting`; a success after a
    /// retry emits `Reconnected`. Exhaustion emits `Interrupted` and returns
    /// the last error.
    pub fn run<T, E, F>(&self, mut connect: F) -> Result<T, E>
    where
        E: fmt::Display,
        F: FnMut() -> Result<T, E>,
    {
        let mut attempt: u32 = 1;
        loop {
            match connect() {
                Ok(value) => {
                    if attempt > 1 {
                        self.events
                            .emit(ServiceEvent::Reconnected { attempts: attempt });
                    }
                    return Ok(value);
                }
                Err(err) => {
                    tracing::debug!(attempt = attempt, error = %err, "connection attempt failed");
                    let exhausted = self
                        .strategy
                        .max_attempts()
                        .is_some_and(|max| attempt >= max);
                    if exhausted {
                        self.events.emit(ServiceEvent::Interrupted {
                            cause: err.to_string(),
                        });
                        return Err(err);
                    }
                }
            }

            thread::sleep(self.strategy.interval());
            attempt = attempt.saturating_add(1);
            self.events.emit(ServiceEvent::Reconnecting { attempt });
        }
    }
}
