use serde_json::Value;
use tracing::debug;

use crate::client::ConnectionRegistry;
use crate::relay::rooms::Rooms;
use crate::transport::message::{Delivery, ServerMessage};

/// The three session-establishment messages the relay forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
}

impl SignalKind {
    fn into_message(self, from_id: &str, payload: Value) -> ServerMessage {
        let from_id = from_id.to_string();
        match self {
            SignalKind::Offer => ServerMessage::SessionOffer { from_id, payload },
            SignalKind::Answer => ServerMessage::SessionAnswer { from_id, payload },
            SignalKind::Candidate => ServerMessage::NetworkCandidate { from_id, payload },
        }
    }
}

/// Routes a signaling payload from `from`.
///
/// A live `target_id` gets it directly. Otherwise it goes to the other members
/// of `room_id`. With neither, nothing is sent.
pub fn forward_signal<R>(
    rooms: &Rooms,
    registry: &R,
    from: &str,
    kind: SignalKind,
    room_id: Option<&str>,
    target_id: Option<&str>,
    payload: Value,
) -> Vec<Delivery>
where
    R: ConnectionRegistry + ?Sized,
{
    if let Some(target) = target_id.filter(|t| registry.is_live(t)) {
        debug!(?kind, from, to = target, "relaying to target");
        return vec![Delivery::new(target, kind.into_message(from, payload))];
    }

    let Some(room_id) = room_id else {
        debug!(?kind, from, ?target_id, "no live target and no room, dropping");
        return Vec::new();
    };

    let recipients = rooms.others(room_id, from);
    if recipients.is_empty() {
        debug!(?kind, from, room = room_id, "room has no other occupants, dropping");
    }
    recipients
        .into_iter()
        .map(|to| Delivery::new(to, kind.into_message(from, payload.clone())))
        .collect()
}

/// Sends chat text to the other members of `room_id`.
pub fn forward_chat(rooms: &Rooms, from: &str, room_id: &str, text: &str) -> Vec<Delivery> {
    rooms
        .others(room_id, from)
        .into_iter()
        .map(|to| {
            Delivery::new(
                to,
                ServerMessage::ChatMessage {
                    from_id: from.to_string(),
                    text: text.to_string(),
                },
            )
        })
        .collect()
}

/// Tells the rest of `room_id` that `from` hung up, then empties the room.
pub fn hangup(rooms: &mut Rooms, from: &str, room_id: &str) -> Vec<Delivery> {
    let deliveries = rooms
        .others(room_id, from)
        .into_iter()
        .map(|to| Delivery::new(to, ServerMessage::PartnerLeft))
        .collect();
    let evicted = rooms.evict(room_id);
    debug!(from, room = room_id, evicted = evicted.len(), "hangup");
    deliveries
}
