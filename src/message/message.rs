use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MessagingError;

/// A message handed to a publisher or returned by a receiver.
///
/// The payload is raw bytes; helpers cover plain strings, bitcode-encoded
/// business objects and JSON. When serialized (for example to log or export
/// a batch), the payload is written as base64.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this message
    pub id: String,
    /// Topic the message was published to; `None` until published
    pub destination: Option<String>,
    #[serde(with = "payload_serde")]
    pub payload: Vec<u8>,
    /// User properties, in insertion order
    pub properties: Vec<(String, String)>,
    pub application_message_id: Option<String>,
    /// Key used by partitioned queues to keep related messages together
    pub partition_key: Option<String>,
    pub priority: Option<u8>,
    /// Set by the broker when the message is delivered again
    pub redelivered: bool,
}

mod payload_serde {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(payload: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        STANDARD.encode(payload).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

impl Message {
    /// Create a message with a generated id.
    pub fn new(payload: Vec<u8>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), payload)
    }

    /// Create a message with an explicit id.
    pub fn with_id(id: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            destination: None,
            payload,
            properties: Vec::new(),
            application_message_id: None,
            partition_key: None,
            priority: None,
            redelivered: false,
        }
    }

    /// Create a message with a UTF-8 string payload.
    pub fn with_string_payload(payload: impl Into<String>) -> Self {
        Self::new(payload.into().into_bytes())
    }

    /// Create a message carrying a bitcode-encoded business object.
    pub fn encode<T: Serialize>(payload: &T) -> Result<Self, MessagingError> {
        Ok(Self::new(bitcode::serialize(payload)?))
    }

    /// Decode a bitcode business object from the payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, MessagingError> {
        Ok(bitcode::deserialize(&self.payload)?)
    }

    /// Create a message carrying a JSON document.
    pub fn json_encode<T: Serialize>(payload: &T) -> Result<Self, MessagingError> {
        Ok(Self::new(serde_json::to_vec(payload)?))
    }

    /// Decode a JSON payload.
    pub fn json_decode<T: DeserializeOwned>(&self) -> Result<T, MessagingError> {
        Ok(serde_json::from_slice(&self.payload)?)
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    pub fn with_application_message_id(mut self, id: impl Into<String>) -> Self {
        self.application_message_id = Some(id.into());
        self
    }

    pub fn with_partition_key(mut self, key: impl Into<String>) -> Self {
        self.partition_key = Some(key.into());
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Look up a user property. Later values win over earlier ones.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get the payload as a string (if valid UTF-8).
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message[{}]", self.id)?;
        if let Some(destination) = &self.destination {
            write!(f, " -> {}", destination)?;
        }
        match self.payload_str() {
            Some(text) => write!(f, ": {}", text),
            None => write!(f, ": <{} bytes>", self.payload.len()),
        }
    }
}
