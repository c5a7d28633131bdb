use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use crate::transport::message::Delivery;

/// Opaque identifier assigned to a connection when the transport accepts it.
pub type ConnectionId = String;

/// Resolves a connection identifier to "is anyone still listening there".
///
/// The matchmaker takes this as a parameter instead of reaching into the
/// transport, so tests can hand it a plain set of ids.
pub trait ConnectionRegistry {
    fn is_live(&self, id: &str) -> bool;
}

impl ConnectionRegistry for HashSet<ConnectionId> {
    fn is_live(&self, id: &str) -> bool {
        self.contains(id)
    }
}

/// Represents a connected WebSocket participant.
///
/// Each client is uniquely identified by an `id` and has a channel (`sender`)
/// drained by the connection's writer task.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for the client, a UUID.
    pub id: ConnectionId,

    /// Channel to send WebSocket frames to the client.
    pub sender: UnboundedSender<WsMessage>,
}

impl Client {
    pub fn new(sender: UnboundedSender<WsMessage>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), sender)
    }

    pub fn with_id(id: impl Into<ConnectionId>, sender: UnboundedSender<WsMessage>) -> Self {
        Self {
            id: id.into(),
            sender,
        }
    }

    /// Serializes `delivery.message` and queues it on the writer channel.
    pub fn send(&self, delivery: &Delivery) -> bool {
        let text = match serde_json::to_string(&delivery.message) {
            Ok(json) => json,
            Err(e) => {
                debug!(to = %self.id, "failed to serialize message: {e}");
                return false;
            }
        };
        self.sender.send(WsMessage::text(text)).is_ok()
    }
}

/// Every live connection known to the hub, keyed by id.
#[derive(Debug, Default)]
pub struct Clients {
    inner: HashMap<ConnectionId, Client>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, client: Client) {
        self.inner.insert(client.id.clone(), client);
    }

    pub fn remove(&mut self, id: &str) -> Option<Client> {
        self.inner.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Client> {
        self.inner.get(id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Pushes one delivery to its recipient. Unknown or closed recipients are
    /// a routing miss and are dropped quietly.
    pub fn send(&self, delivery: &Delivery) -> bool {
        match self.inner.get(&delivery.to) {
            Some(client) if client.send(delivery) => true,
            Some(_) => {
                debug!(to = %delivery.to, "recipient channel closed, dropping message");
                false
            }
            None => {
                debug!(to = %delivery.to, "no client registered, dropping message");
                false
            }
        }
    }
}

impl ConnectionRegistry for Clients {
    fn is_live(&self, id: &str) -> bool {
        self.inner
            .get(id)
            .is_some_and(|client| !client.sender.is_closed())
    }
}
