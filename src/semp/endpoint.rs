//! SEMP v2 paths and request/response bodies.
//!
//! Paths are returned as unencoded segments; the client percent-encodes each
//! one, so queue names and topics containing `/` stay a single segment.

use serde::{Deserialize, Serialize};

use crate::capability::QueueSpec;

const DEAD_MSG_QUEUE: &str = "#DEAD_MSG_QUEUE";

pub fn about() -> Vec<String> {
    segments(&["SEMP", "v2", "monitor", "about"])
}

pub fn queues(vpn: &str) -> Vec<String> {
    segments(&["SEMP", "v2", "config", "msgVpns", vpn, "queues"])
}

pub fn queue(vpn: &str, queue: &str) -> Vec<String> {
    let mut path = queues(vpn);
    path.push(queue.to_string());
    path
}

pub fn subscriptions(vpn: &str, queue_name: &str) -> Vec<String> {
    let mut path = queue(vpn, queue_name);
    path.push("subscriptions".to_string());
    path
}

pub fn subscription(vpn: &str, queue_name: &str, topic: &str) -> Vec<String> {
    let mut path = subscriptions(vpn, queue_name);
    path.push(topic.to_string());
    path
}

fn segments(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Body of the initial queue POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueCreate {
    pub queue_name: String,
    pub egress_enabled: bool,
    pub ingress_enabled: bool,
    pub permission: String,
}

impl From<&QueueSpec> for QueueCreate {
    fn from(spec: &QueueSpec) -> Self {
        Self {
            queue_name: spec.name.clone(),
            egress_enabled: true,
            ingress_enabled: true,
            permission: "consume".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventThreshold {
    pub clear_percent: u8,
    pub set_percent: u8,
}

impl Default for EventThreshold {
    fn default() -> Self {
        Self {
            clear_percent: 60,
            set_percent: 80,
        }
    }
}

/// Full queue configuration sent as a PATCH after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueConfig {
    pub queue_name: String,
    pub msg_vpn_name: String,
    pub access_type: String,
    pub consumer_ack_propagation_enabled: bool,
    pub dead_msg_queue: String,
    pub egress_enabled: bool,
    pub ingress_enabled: bool,
    pub event_bind_count_threshold: EventThreshold,
    pub event_msg_spool_usage_threshold: EventThreshold,
    pub event_reject_low_priority_msg_limit_threshold: EventThreshold,
    pub max_bind_count: u32,
    pub max_delivered_unacked_msgs_per_flow: u32,
    pub max_msg_size: u32,
    pub max_msg_spool_usage: u64,
    pub max_redelivery_count: u32,
    pub max_ttl: u32,
    pub owner: String,
    pub permission: String,
    pub reject_low_priority_msg_enabled: bool,
    pub reject_low_priority_msg_limit: u32,
    pub reject_msg_to_sender_on_discard_behavior: String,
    pub respect_msg_priority_enabled: bool,
    pub respect_ttl_enabled: bool,
}

impl QueueConfig {
    pub fn new(spec: &QueueSpec, vpn: &str) -> Self {
        Self {
            queue_name: spec.name.clone(),
            msg_vpn_name: vpn.to_string(),
            access_type: spec.access_type.as_str().to_string(),
            consumer_ack_propagation_enabled: true,
            dead_msg_queue: DEAD_MSG_QUEUE.to_string(),
            egress_enabled: spec.egress_enabled,
            ingress_enabled: spec.ingress_enabled,
            event_bind_count_threshold: EventThreshold::default(),
            event_msg_spool_usage_threshold: EventThreshold::default(),
            event_reject_low_priority_msg_limit_threshold: EventThreshold::default(),
            max_bind_count: 1000,
            max_delivered_unacked_msgs_per_flow: 10000,
            max_msg_size: 10_000_000,
            max_msg_spool_usage: spec.max_msg_spool_usage,
            max_redelivery_count: spec.max_redelivery_count,
            max_ttl: 0,
            owner: String::new(),
            permission: "consume".to_string(),
            reject_low_priority_msg_enabled: false,
            reject_low_priority_msg_limit: 0,
            reject_msg_to_sender_on_discard_behavior: "when-queue-enabled".to_string(),
            respect_msg_priority_enabled: false,
            respect_ttl_enabled: false,
        }
    }
}

/// Partial PATCH toggling a queue's ingress and egress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSwitch {
    pub ingress_enabled: bool,
    pub egress_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionCreate {
    pub subscription_topic: String,
}

/// Envelope of every SEMP response.
#[derive(Debug, Clone, Deserialize)]
pub struct SempResponse {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    pub meta: Meta,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub response_code: u16,
    #[serde(default)]
    pub error: Option<MetaError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
