//! Wire protocol.
//!
//! Every frame is a JSON object tagged by `"type"` with kebab-case names and
//! camelCase fields. Signaling payloads are carried as raw `serde_json::Value`
//! and never inspected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::ConnectionId;

/// Identifier scoping relayed messages to one matched pair.
pub type RoomId = String;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    JoinQueue {
        #[serde(default)]
        topic: Option<String>,
    },
    LeaveQueue,
    SessionOffer {
        #[serde(default)]
        room_id: Option<RoomId>,
        #[serde(default)]
        target_id: Option<ConnectionId>,
        #[serde(default)]
        payload: Value,
    },
    SessionAnswer {
        #[serde(default)]
        room_id: Option<RoomId>,
        #[serde(default)]
        target_id: Option<ConnectionId>,
        #[serde(default)]
        payload: Value,
    },
    NetworkCandidate {
        #[serde(default)]
        room_id: Option<RoomId>,
        #[serde(default)]
        target_id: Option<ConnectionId>,
        #[serde(default)]
        payload: Value,
    },
    Hangup {
        room_id: RoomId,
    },
    ChatMessage {
        room_id: RoomId,
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Searching,
    Matched {
        room_id: RoomId,
        partner_id: ConnectionId,
    },
    LeftQueue,
    PartnerLeft,
    ValidationError {
        reason: String,
    },
    SessionOffer {
        from_id: ConnectionId,
        payload: Value,
    },
    SessionAnswer {
        from_id: ConnectionId,
        payload: Value,
    },
    NetworkCandidate {
        from_id: ConnectionId,
        payload: Value,
    },
    ChatMessage {
        from_id: ConnectionId,
        text: String,
    },
}

impl ServerMessage {
    pub fn validation_error(reason: impl ToString) -> Self {
        Self::ValidationError {
            reason: reason.to_string(),
        }
    }
}

/// One outbound message addressed to one connection.
///
/// The hub and its components never write to sockets themselves; they return
/// deliveries and the transport pushes them out.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: ConnectionId,
    pub message: ServerMessage,
}

impl Delivery {
    pub fn new(to: impl Into<ConnectionId>, message: ServerMessage) -> Self {
        Self {
            to: to.into(),
            message,
        }
    }
}
