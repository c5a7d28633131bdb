use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use peerlink::Hub;
use peerlink::config::MatchmakerSettings;
use peerlink::transport::{ServerMessage, serve};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server(hub: Hub) -> (String, Arc<Mutex<Hub>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let hub = Arc::new(Mutex::new(hub));
    tokio::spawn(serve(listener, hub.clone()));
    (url, hub)
}

async fn connect(url: &str) -> Ws {
    let (ws, _) = connect_async(url).await.expect("WebSocket handshake failed");
    ws
}

async fn send(ws: &mut Ws, value: Value) {
    ws.send(WsMessage::text(value.to_string()))
        .await
        .expect("Failed to send");
}

async fn recv(ws: &mut Ws) -> ServerMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("Timed out waiting for a server message")
            .expect("Stream ended")
            .expect("WebSocket error");
        if let WsMessage::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap_or_else(|e| {
                panic!(
                    "Failed to deserialize ServerMessage from '{}': {e}",
                    text.as_str()
                )
            });
        }
    }
}

async fn assert_silent(ws: &mut Ws) {
    let res = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(res.is_err(), "expected no message, got {res:?}");
}

/// Connects two clients and matches them under "chat". Returns the room id
/// and each side's connection id.
async fn matched_pair(url: &str) -> (Ws, Ws, String, String, String) {
    let mut c1 = connect(url).await;
    let mut c2 = connect(url).await;

    send(&mut c1, json!({ "type": "join-queue", "topic": "chat" })).await;
    assert_eq!(recv(&mut c1).await, ServerMessage::Searching);

    send(&mut c2, json!({ "type": "join-queue", "topic": "chat" })).await;
    let ServerMessage::Matched {
        room_id: room_for_c2,
        partner_id: c1_id,
    } = recv(&mut c2).await
    else {
        panic!("c2 expected matched");
    };
    let ServerMessage::Matched {
        room_id: room_for_c1,
        partner_id: c2_id,
    } = recv(&mut c1).await
    else {
        panic!("c1 expected matched");
    };
    assert_eq!(room_for_c1, room_for_c2);
    (c1, c2, room_for_c1, c1_id, c2_id)
}

#[tokio::test]
async fn two_clients_are_matched_into_the_same_room() {
    let (url, hub) = start_server(Hub::default()).await;
    let (_c1, _c2, room, c1_id, c2_id) = matched_pair(&url).await;

    let hub = hub.lock().unwrap();
    assert_eq!(hub.matchmaker().partner_of(&c1_id).unwrap().id, c2_id);
    assert_eq!(hub.matchmaker().partner_of(&c2_id).unwrap().room_id, room);
}

#[tokio::test]
async fn offer_answer_and_candidates_are_relayed_with_sender() {
    let (url, _hub) = start_server(Hub::default()).await;
    let (mut c1, mut c2, room, c1_id, c2_id) = matched_pair(&url).await;

    send(
        &mut c1,
        json!({ "type": "session-offer", "roomId": room, "payload": { "sdp": "offer-sdp" } }),
    )
    .await;
    assert_eq!(
        recv(&mut c2).await,
        ServerMessage::SessionOffer {
            from_id: c1_id.clone(),
            payload: json!({ "sdp": "offer-sdp" }),
        }
    );

    send(
        &mut c2,
        json!({ "type": "session-answer", "targetId": c1_id, "payload": { "sdp": "answer-sdp" } }),
    )
    .await;
    assert_eq!(
        recv(&mut c1).await,
        ServerMessage::SessionAnswer {
            from_id: c2_id.clone(),
            payload: json!({ "sdp": "answer-sdp" }),
        }
    );

    send(
        &mut c1,
        json!({ "type": "network-candidate", "roomId": room, "payload": "candidate:1" }),
    )
    .await;
    assert_eq!(
        recv(&mut c2).await,
        ServerMessage::NetworkCandidate {
            from_id: c1_id,
            payload: json!("candidate:1"),
        }
    );

    send(&mut c2, json!({ "type": "chat-message", "roomId": room, "text": "hello" })).await;
    assert_eq!(
        recv(&mut c1).await,
        ServerMessage::ChatMessage {
            from_id: c2_id,
            text: "hello".to_string(),
        }
    );
}

#[tokio::test]
async fn hangup_notifies_partner_and_empties_room() {
    let (url, hub) = start_server(Hub::default()).await;
    let (mut c1, mut c2, room, _c1_id, _c2_id) = matched_pair(&url).await;

    send(&mut c1, json!({ "type": "hangup", "roomId": room })).await;
    assert_eq!(recv(&mut c2).await, ServerMessage::PartnerLeft);
    assert_silent(&mut c1).await;

    let hub = hub.lock().unwrap();
    assert!(hub.rooms().members(&room).is_empty());
}

#[tokio::test]
async fn disconnect_notifies_partner_once_and_frees_it() {
    let (url, _hub) = start_server(Hub::default()).await;
    let (c1, mut c2, _room, _c1_id, _c2_id) = matched_pair(&url).await;

    drop(c1);
    assert_eq!(recv(&mut c2).await, ServerMessage::PartnerLeft);
    assert_silent(&mut c2).await;

    send(&mut c2, json!({ "type": "join-queue", "topic": "chat" })).await;
    assert_eq!(recv(&mut c2).await, ServerMessage::Searching);
}

#[tokio::test]
async fn leave_queue_is_acknowledged() {
    let (url, _hub) = start_server(Hub::default()).await;
    let (mut c1, mut c2, _room, _c1_id, _c2_id) = matched_pair(&url).await;

    send(&mut c2, json!({ "type": "leave-queue" })).await;
    assert_eq!(recv(&mut c2).await, ServerMessage::LeftQueue);
    assert_eq!(recv(&mut c1).await, ServerMessage::PartnerLeft);
}

#[tokio::test]
async fn invalid_requests_get_validation_errors() {
    let (url, _hub) = start_server(Hub::default()).await;
    let mut c1 = connect(&url).await;

    send(&mut c1, json!({ "type": "join-queue" })).await;
    assert_eq!(
        recv(&mut c1).await,
        ServerMessage::validation_error("missing_topic")
    );

    c1.send(WsMessage::text("definitely not json")).await.unwrap();
    assert_eq!(
        recv(&mut c1).await,
        ServerMessage::validation_error("malformed_message")
    );
}

#[tokio::test]
async fn connections_over_the_limit_are_refused() {
    let (url, _hub) = start_server(Hub::new(&MatchmakerSettings {
        max_connections: 1,
        room_prefix: "room".to_string(),
    }))
    .await;
    let mut c1 = connect(&url).await;
    send(&mut c1, json!({ "type": "join-queue", "topic": "chat" })).await;
    assert_eq!(recv(&mut c1).await, ServerMessage::Searching);

    let mut c2 = connect(&url).await;
    assert_eq!(
        recv(&mut c2).await,
        ServerMessage::validation_error("server_at_capacity")
    );
}
