//! Connection lifecycle: reconnection policy and service event notification.

mod events;
mod retry;

pub use events::{LifecycleEvents, ServiceEvent, ServiceEventKind};
pub use retry::{Reconnector, RetryStrategy};
