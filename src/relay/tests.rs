use std::collections::HashSet;

use serde_json::json;

use super::{Rooms, SignalKind, forward_chat, forward_signal, hangup};
use crate::client::ConnectionId;
use crate::transport::message::{Delivery, ServerMessage};

fn live(ids: &[&str]) -> HashSet<ConnectionId> {
    ids.iter().map(|id| id.to_string()).collect()
}

fn room_with(room_id: &str, ids: &[&str]) -> Rooms {
    let mut rooms = Rooms::new();
    for id in ids {
        rooms.join(room_id, id);
    }
    rooms
}

#[test]
fn test_rooms_join_others_and_evict() {
    let mut rooms = room_with("r1", &["a", "b"]);
    assert_eq!(rooms.others("r1", "a"), vec!["b".to_string()]);
    assert_eq!(rooms.members("r1").len(), 2);
    assert!(rooms.contains("r1", "b"));

    let evicted = rooms.evict("r1");
    assert_eq!(evicted, vec!["a".to_string(), "b".to_string()]);
    assert!(rooms.is_empty());
    assert!(rooms.evict("r1").is_empty());
}

#[test]
fn test_rooms_leave_all_drops_empty_rooms() {
    let mut rooms = room_with("r1", &["a", "b"]);
    rooms.join("r2", "a");
    rooms.leave_all("a");
    assert_eq!(rooms.members("r1"), vec!["b".to_string()]);
    assert_eq!(rooms.len(), 1);
}

#[test]
fn test_offer_to_live_target_goes_direct() {
    let rooms = Rooms::new();
    let payload = json!({ "sdp": "v=0" });
    let out = forward_signal(
        &rooms,
        &live(&["a", "b"]),
        "a",
        SignalKind::Offer,
        None,
        Some("b"),
        payload.clone(),
    );
    assert_eq!(
        out,
        vec![Delivery::new(
            "b",
            ServerMessage::SessionOffer {
                from_id: "a".to_string(),
                payload,
            }
        )]
    );
}

#[test]
fn test_answer_by_room_skips_sender() {
    let rooms = room_with("r1", &["a", "b"]);
    let out = forward_signal(
        &rooms,
        &live(&["a", "b"]),
        "b",
        SignalKind::Answer,
        Some("r1"),
        None,
        json!("answer-sdp"),
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].to, "a");
    assert!(matches!(
        &out[0].message,
        ServerMessage::SessionAnswer { from_id, .. } if from_id == "b"
    ));
}

#[test]
fn test_dead_target_falls_back_to_room() {
    let rooms = room_with("r1", &["a", "b"]);
    let out = forward_signal(
        &rooms,
        &live(&["a", "b"]),
        "a",
        SignalKind::Candidate,
        Some("r1"),
        Some("ghost"),
        json!({ "candidate": "udp 1" }),
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].to, "b");
    assert!(matches!(out[0].message, ServerMessage::NetworkCandidate { .. }));
}

#[test]
fn test_routing_miss_is_silent() {
    let rooms = Rooms::new();
    let registry = live(&["a"]);
    assert!(
        forward_signal(&rooms, &registry, "a", SignalKind::Offer, None, Some("ghost"), json!(null))
            .is_empty()
    );
    assert!(
        forward_signal(&rooms, &registry, "a", SignalKind::Offer, Some("nope"), None, json!(null))
            .is_empty()
    );
    assert!(
        forward_signal(&rooms, &registry, "a", SignalKind::Offer, None, None, json!(null))
            .is_empty()
    );
}

#[test]
fn test_payload_is_forwarded_untouched() {
    let rooms = room_with("r1", &["a", "b"]);
    let payload = json!({ "weird": [1, "two", { "three": null }], "sdp": 42 });
    let out = forward_signal(
        &rooms,
        &live(&["a", "b"]),
        "a",
        SignalKind::Offer,
        Some("r1"),
        None,
        payload.clone(),
    );
    assert!(matches!(
        &out[0].message,
        ServerMessage::SessionOffer { payload: p, .. } if *p == payload
    ));
}

#[test]
fn test_chat_goes_to_room_others() {
    let rooms = room_with("r1", &["a", "b"]);
    let out = forward_chat(&rooms, "a", "r1", "hello");
    assert_eq!(
        out,
        vec![Delivery::new(
            "b",
            ServerMessage::ChatMessage {
                from_id: "a".to_string(),
                text: "hello".to_string(),
            }
        )]
    );
    assert!(forward_chat(&rooms, "a", "r2", "hello").is_empty());
}

#[test]
fn test_hangup_notifies_and_evicts_room() {
    let mut rooms = room_with("r1", &["c1", "c2"]);
    let out = hangup(&mut rooms, "c1", "r1");
    assert_eq!(out, vec![Delivery::new("c2", ServerMessage::PartnerLeft)]);
    assert!(!rooms.contains("r1", "c1"));
    assert!(!rooms.contains("r1", "c2"));
    assert!(hangup(&mut rooms, "c1", "r1").is_empty());
}
