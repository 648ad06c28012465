use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::member::{MemberRecord, Status};

/// Exact, case-sensitive method vocabulary (`spec.md` §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "PING")]
    Ping,
    #[serde(rename = "PONG")]
    Pong,
    #[serde(rename = "JOIN")]
    Join,
    #[serde(rename = "LEAVE")]
    Leave,
    #[serde(rename = "SWITCH")]
    Switch,
}

/// On-wire message. `payload` is opaque bytes: empty/absent for most
/// methods, a serialized [`WireMember`] list for a gossip-mode PING.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub method: Method,
    pub sender_id: String,
    pub sender_addr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<u8>>,
}

impl Message {
    pub fn new(method: Method, sender_id: impl Into<String>, sender_addr: impl Into<String>) -> Self {
        Self {
            method,
            sender_id: sender_id.into(),
            sender_addr: sender_addr.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Wire representation of a membership record, used as the gossip payload.
/// Kept distinct from [`MemberRecord`] because [`MemberRecord::timestamp`]
/// is a monotonic [`tokio::time::Instant`] and cannot be serialized; the
/// wire timestamp is wall-clock and carried for display/debugging only —
/// `merge_gossip` never trusts a peer's self-reported clock for liveness
/// decisions, only the locally observed counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMember {
    pub id: String,
    pub addr: String,
    pub heartbeat_counter: u64,
    pub status: Status,
    pub timestamp: DateTime<Utc>,
}

impl From<&MemberRecord> for WireMember {
    fn from(m: &MemberRecord) -> Self {
        WireMember {
            id: m.id.clone(),
            addr: m.addr.clone(),
            heartbeat_counter: m.heartbeat_counter,
            status: m.status,
            timestamp: Utc::now(),
        }
    }
}

/// Serializes a `Message` to its self-describing on-wire byte form.
pub fn encode_message(message: &Message) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(message)?)
}

/// Deserializes a `Message` from its on-wire byte form. Malformed payloads
/// surface as a `MembershipError::Codec` for the caller to log and discard.
pub fn decode_message(bytes: &[u8]) -> Result<Message> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Serializes a membership snapshot for a gossip PING payload.
pub fn encode_member_list(members: &[WireMember]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(members)?)
}

/// Deserializes a gossip PING payload back into a membership snapshot.
pub fn decode_member_list(bytes: &[u8]) -> Result<Vec<WireMember>> {
    Ok(serde_json::from_slice(bytes)?)
}
