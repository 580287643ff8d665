//! Messages and destinations.
//!
//! A [`Message`] is an immutable payload plus metadata. It is published to a
//! [`Topic`]; queues attract messages through [`TopicSubscription`]s and are
//! consumed via [`Queue`] handles.

mod destination;
mod message;

pub use destination::{Queue, Topic, TopicSubscription};
pub use message::Message;
