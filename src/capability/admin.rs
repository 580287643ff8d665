use std::fmt;

use serde::{Deserialize, Serialize};

/// Queue access type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessType {
    Exclusive,
    NonExclusive,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::Exclusive => "exclusive",
            AccessType::NonExclusive => "non-exclusive",
        }
    }
}

/// Desired configuration for a queue provisioned through [`QueueAdmin`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSpec {
    pub name: String,
    pub access_type: AccessType,
    pub ingress_enabled: bool,
    pub egress_enabled: bool,
    /// Replace an existing queue of the same name instead of failing.
    pub delete_if_exists: bool,
    /// Spool quota in megabytes.
    pub max_msg_spool_usage: u64,
    /// 0 means redeliver without limit.
    pub max_redelivery_count: u32,
}

impl QueueSpec {
    pub fn exclusive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            access_type: AccessType::Exclusive,
            ingress_enabled: true,
            egress_enabled: true,
            delete_if_exists: true,
            max_msg_spool_usage: 1500,
            max_redelivery_count: 0,
        }
    }

    pub fn non_exclusive(name: impl Into<String>) -> Self {
        Self {
            access_type: AccessType::NonExclusive,
            ..Self::exclusive(name)
        }
    }

    pub fn with_egress(mut self, enabled: bool) -> Self {
        self.egress_enabled = enabled;
        self
    }

    pub fn keep_existing(mut self) -> Self {
        self.delete_if_exists = false;
        self
    }
}

/// Administration of broker queues and their topic subscriptions.
pub trait QueueAdmin {
    type Error: fmt::Display;

    fn create_queue(&self, spec: &QueueSpec) -> Result<(), Self::Error>;

    fn delete_queue(&self, name: &str) -> Result<(), Self::Error>;

    /// Attract messages published to `topic` into the queue. Adding a
    /// subscription that already exists succeeds.
    fn add_subscription(&self, queue: &str, topic: &str) -> Result<(), Self::Error>;

    fn remove_subscription(&self, queue: &str, topic: &str) -> Result<(), Self::Error>;

    /// Disable ingress and egress without deleting the queue.
    fn shutdown_queue(&self, name: &str) -> Result<(), Self::Error>;
}
