//! Hub
//!
//! The single piece of shared state a server holds: the table of live clients,
//! the matchmaker and the relay's room membership. Every inbound frame becomes
//! one `handle` call, which returns the deliveries it produced; `dispatch`
//! then pushes them onto client channels.
//!
//! The hub is meant to live behind one `Arc<Mutex<Hub>>`. Holding that lock
//! for a whole `handle` + `dispatch` is what keeps matchmaking atomic, and
//! neither call awaits.

use tracing::{debug, info, warn};

use crate::client::{Client, Clients, ConnectionRegistry};
use crate::config::MatchmakerSettings;
use crate::matchmaker::Matchmaker;
use crate::relay::{self, Rooms, SignalKind};
use crate::transport::message::{ClientMessage, Delivery, RoomId, ServerMessage};
use crate::utils::{Error, Result};

#[derive(Debug)]
pub struct Hub {
    clients: Clients,
    matchmaker: Matchmaker,
    rooms: Rooms,
    max_connections: usize,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(&crate::config::Settings::default().matchmaker)
    }
}

impl Hub {
    pub fn new(settings: &MatchmakerSettings) -> Self {
        Self {
            clients: Clients::new(),
            matchmaker: Matchmaker::with_room_prefix(&settings.room_prefix),
            rooms: Rooms::new(),
            max_connections: settings.max_connections,
        }
    }

    /// Registers a freshly accepted connection.
    pub fn connect(&mut self, client: Client) -> Result<()> {
        if self.clients.len() >= self.max_connections {
            warn!(connection = %client.id, limit = self.max_connections, "refusing connection");
            return Err(Error::AtCapacity(self.max_connections));
        }
        let id = client.id.clone();
        self.clients.register(client);
        let stats = self.matchmaker.stats();
        info!(
            connection = %id,
            live = self.clients.len(),
            queued = stats.queued,
            partnered = stats.partnered,
            "connected"
        );
        Ok(())
    }

    /// Decodes a text frame and handles it. Undecodable frames earn the
    /// sender a validation error.
    pub fn handle_text(&mut self, from: &str, text: &str) -> Vec<Delivery> {
        if !self.clients.is_live(from) {
            debug!(connection = %from, "ignoring frame from departed connection");
            return Vec::new();
        }
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => self.handle(from, message),
            Err(e) => {
                warn!(
                    connection = %from,
                    "invalid client message: {e} | {}",
                    text.chars().take(100).collect::<String>()
                );
                let err = Error::MalformedMessage(e);
                vec![Delivery::new(from, ServerMessage::validation_error(err))]
            }
        }
    }

    /// Frames from a connection that is no longer live are dropped, so a
    /// departed id can never be queued or matched again.
    pub fn handle(&mut self, from: &str, message: ClientMessage) -> Vec<Delivery> {
        if !self.clients.is_live(from) {
            debug!(connection = %from, "ignoring message from departed connection");
            return Vec::new();
        }
        match message {
            ClientMessage::JoinQueue { topic } => {
                let previous_room = self.room_of(from);
                let topic = topic.unwrap_or_default();
                match self.matchmaker.join(from, &topic, &self.clients) {
                    Ok(deliveries) => {
                        if previous_room != self.room_of(from) {
                            self.close_room(previous_room);
                        }
                        self.open_rooms(&deliveries);
                        deliveries
                    }
                    Err(e) => {
                        debug!(connection = %from, "join rejected: {e}");
                        vec![Delivery::new(from, ServerMessage::validation_error(e))]
                    }
                }
            }
            ClientMessage::LeaveQueue => {
                let room = self.room_of(from);
                let deliveries = self.matchmaker.leave(from);
                self.close_room(room);
                deliveries
            }
            ClientMessage::SessionOffer {
                room_id,
                target_id,
                payload,
            } => self.signal(from, SignalKind::Offer, room_id, target_id, payload),
            ClientMessage::SessionAnswer {
                room_id,
                target_id,
                payload,
            } => self.signal(from, SignalKind::Answer, room_id, target_id, payload),
            ClientMessage::NetworkCandidate {
                room_id,
                target_id,
                payload,
            } => self.signal(from, SignalKind::Candidate, room_id, target_id, payload),
            ClientMessage::ChatMessage { room_id, text } => {
                relay::forward_chat(&self.rooms, from, &room_id, &text)
            }
            ClientMessage::Hangup { room_id } => {
                let deliveries = relay::hangup(&mut self.rooms, from, &room_id);
                self.matchmaker.release(from, &room_id);
                deliveries
            }
        }
    }

    /// Forgets a connection that went away and tells its partner, if any.
    pub fn disconnect(&mut self, id: &str) -> Vec<Delivery> {
        let room = self.room_of(id);
        let deliveries = self.matchmaker.disconnect(id);
        self.close_room(room);
        self.rooms.leave_all(id);
        self.clients.remove(id);
        let stats = self.matchmaker.stats();
        info!(
            connection = %id,
            live = self.clients.len(),
            queued = stats.queued,
            partnered = stats.partnered,
            "disconnected"
        );
        deliveries
    }

    /// Pushes deliveries to their recipients' channels. Misses are dropped.
    pub fn dispatch(&self, deliveries: Vec<Delivery>) {
        for delivery in &deliveries {
            self.clients.send(delivery);
        }
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    pub fn matchmaker(&self) -> &Matchmaker {
        &self.matchmaker
    }

    pub fn rooms(&self) -> &Rooms {
        &self.rooms
    }

    pub fn is_live(&self, id: &str) -> bool {
        self.clients.is_live(id)
    }

    fn signal(
        &self,
        from: &str,
        kind: SignalKind,
        room_id: Option<RoomId>,
        target_id: Option<String>,
        payload: serde_json::Value,
    ) -> Vec<Delivery> {
        relay::forward_signal(
            &self.rooms,
            &self.clients,
            from,
            kind,
            room_id.as_deref(),
            target_id.as_deref(),
            payload,
        )
    }

    fn room_of(&self, id: &str) -> Option<RoomId> {
        self.matchmaker.partner_of(id).map(|p| p.room_id.clone())
    }

    fn open_rooms(&mut self, deliveries: &[Delivery]) {
        for delivery in deliveries {
            if let ServerMessage::Matched { room_id, .. } = &delivery.message {
                self.rooms.join(room_id, &delivery.to);
            }
        }
    }

    fn close_room(&mut self, room: Option<RoomId>) {
        if let Some(room_id) = room {
            self.rooms.evict(&room_id);
        }
    }
}
