//! SEMP v2 management client (feature `semp`).
//!
//! Provisions queues and topic subscriptions on a real broker through its
//! REST management API. [`SempClient`] implements [`crate::QueueAdmin`], so
//! setup code can run against either a broker or an
//! [`crate::InMemoryBroker`].

mod client;
pub mod endpoint;
mod error;

pub use client::SempClient;
pub use error::SempError;
