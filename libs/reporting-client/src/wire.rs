use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════════
//  GET /v1/topic/{topic}/{partition}/{offset}
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<MessageEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageEntry {
    pub message: serde_json::Value,
    pub next_offset: u64,
}

// ═══════════════════════════════════════════════════════════════
//  GET /v1/topic, GET /v1/topic/{topic}
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub(crate) struct TopicsResponse {
    pub topics: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopicResponse {
    /// partition id (строкой) → границы offset'ов.
    pub partition: BTreeMap<String, PartitionOffsets>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PartitionOffsets {
    pub earliest_offset: u64,
    pub latest_offset: u64,
}

// ═══════════════════════════════════════════════════════════════
//  POST /v1/topic/{topic}
// ═══════════════════════════════════════════════════════════════

pub const ENVELOPE_VERSION: u32 = 1;

/// Конверт одного сообщения для отправки в API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub id: Uuid,
    pub session: Uuid,
    pub schema: String,
    pub version: u32,
    pub data: serde_json::Map<String, serde_json::Value>,
}
