//! Broker connection configuration.
//!
//! [`ServiceConfig`] replaces property dictionaries: it is built in code or
//! loaded from a JSON [`PropertiesFile`] and passed explicitly to whatever
//! creates the messaging service.

mod properties;
mod service;

pub use properties::{PropertiesFile, SempConfig};
pub use service::{AuthScheme, ServiceConfig, TlsConfig, DEFAULT_RECEIVE_TIMEOUT_MS};
