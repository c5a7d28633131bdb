//! Matchmaker engine
//!
//! This module owns the in-memory pairing state:
//! - topic-keyed FIFO queues of waiting connections
//! - a reverse index from connection to the topic it waits under
//! - the symmetric partner map of matched connections and their room
//!
//! Concurrency and usage notes:
//! - The API is synchronous and meant to sit behind one lock together with
//!   the rest of the hub (`Arc<Mutex<Hub>>`). Every call runs to completion,
//!   so popping a partner and recording the pair can never interleave with
//!   another connection's request.
//! - Nothing here performs I/O. Operations return the deliveries they want
//!   sent and the caller pushes them to sockets.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::{ConnectionId, ConnectionRegistry};
use crate::matchmaker::queue::TopicQueue;
use crate::transport::message::{Delivery, RoomId, ServerMessage};
use crate::utils::{Error, Result};

/// The other half of a partnership, as seen from one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partner {
    pub id: ConnectionId,
    pub room_id: RoomId,
}

/// Point-in-time counts, logged by the hub on connect and disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub topics: usize,
    pub queued: usize,
    pub partnered: usize,
}

#[derive(Debug)]
pub struct Matchmaker {
    queues: HashMap<String, TopicQueue>,
    queued_under: HashMap<ConnectionId, String>,
    partners: HashMap<ConnectionId, Partner>,
    room_prefix: String,
}

impl Default for Matchmaker {
    fn default() -> Self {
        Self::new()
    }
}

impl Matchmaker {
    pub const DEFAULT_ROOM_PREFIX: &'static str = "room";

    pub fn new() -> Self {
        Self::with_room_prefix(Self::DEFAULT_ROOM_PREFIX)
    }

    pub fn with_room_prefix(prefix: &str) -> Self {
        Self {
            queues: HashMap::new(),
            queued_under: HashMap::new(),
            partners: HashMap::new(),
            room_prefix: prefix.to_string(),
        }
    }

    /// Puts `requester` in line for `topic`, or pairs it with whoever has been
    /// waiting there longest.
    ///
    /// Queue entries whose connection is no longer live are discarded as they
    /// are popped. If the queue runs dry the requester is queued instead.
    /// Joining while partnered ends the current partnership first.
    pub fn join<R>(&mut self, requester: &str, topic: &str, registry: &R) -> Result<Vec<Delivery>>
    where
        R: ConnectionRegistry + ?Sized,
    {
        if topic.is_empty() {
            return Err(Error::MissingTopic);
        }

        if self.queued_topic(requester) == Some(topic) {
            debug!(connection = %requester, topic, "already searching");
            return Ok(vec![Delivery::new(requester, ServerMessage::Searching)]);
        }

        let mut deliveries = self.notify_and_unpair(requester);
        self.dequeue(requester);

        while let Some(candidate) = self.pop_oldest(topic) {
            if !registry.is_live(&candidate) {
                warn!(connection = %candidate, topic, "skipping stale queue entry");
                continue;
            }

            let room_id = self.next_room_id();
            self.pair(requester, &candidate, &room_id);
            info!(
                requester = %requester,
                partner = %candidate,
                room = %room_id,
                topic,
                "matched"
            );

            deliveries.push(Delivery::new(
                requester,
                ServerMessage::Matched {
                    room_id: room_id.clone(),
                    partner_id: candidate.clone(),
                },
            ));
            deliveries.push(Delivery::new(
                candidate,
                ServerMessage::Matched {
                    room_id,
                    partner_id: requester.to_string(),
                },
            ));
            self.debug_check();
            return Ok(deliveries);
        }

        self.enqueue(topic, requester);
        debug!(connection = %requester, topic, waiting = self.queue_len(topic), "searching");
        deliveries.push(Delivery::new(requester, ServerMessage::Searching));
        self.debug_check();
        Ok(deliveries)
    }

    /// Voluntary exit: tells the partner, drops any queue entry, acknowledges.
    pub fn leave(&mut self, requester: &str) -> Vec<Delivery> {
        let mut deliveries = self.notify_and_unpair(requester);
        self.dequeue(requester);
        deliveries.push(Delivery::new(requester, ServerMessage::LeftQueue));
        self.debug_check();
        deliveries
    }

    /// Same cleanup as [`leave`](Self::leave) without the acknowledgment,
    /// since the requester is gone.
    pub fn disconnect(&mut self, requester: &str) -> Vec<Delivery> {
        let deliveries = self.notify_and_unpair(requester);
        self.dequeue(requester);
        self.debug_check();
        deliveries
    }

    /// Ends the partnership of `requester` without notifying anyone, provided
    /// it lives in `room_id`. Used after a hangup, where the relay already
    /// told the room.
    pub fn release(&mut self, requester: &str, room_id: &str) -> Option<Partner> {
        if self.partners.get(requester)?.room_id != room_id {
            return None;
        }
        let partner = self.unpair(requester);
        self.debug_check();
        partner
    }

    pub fn partner_of(&self, id: &str) -> Option<&Partner> {
        self.partners.get(id)
    }

    pub fn queued_topic(&self, id: &str) -> Option<&str> {
        self.queued_under.get(id).map(String::as_str)
    }

    pub fn queue_len(&self, topic: &str) -> usize {
        self.queues.get(topic).map_or(0, TopicQueue::len)
    }

    /// Waiting connections for `topic`, oldest first.
    pub fn waiting(&self, topic: &str) -> Vec<&str> {
        self.queues
            .get(topic)
            .map(|q| q.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> Stats {
        Stats {
            topics: self.queues.len(),
            queued: self.queued_under.len(),
            partnered: self.partners.len(),
        }
    }

    /// Panics if the queues, the membership index and the partner map
    /// disagree. Any failure here is a bug in this module.
    pub fn assert_invariants(&self) {
        let mut seen = 0;
        for (topic, queue) in &self.queues {
            assert!(!queue.is_empty(), "empty queue kept for topic {topic}");
            for id in queue.iter() {
                seen += 1;
                assert_eq!(
                    self.queued_under.get(id).map(String::as_str),
                    Some(topic.as_str()),
                    "{id} waits under {topic} but the index disagrees"
                );
                assert!(
                    !self.partners.contains_key(id),
                    "{id} is both queued and partnered"
                );
            }
        }
        assert_eq!(
            seen,
            self.queued_under.len(),
            "membership index holds entries missing from queues"
        );

        for (id, partner) in &self.partners {
            assert_ne!(id, &partner.id, "{id} is partnered with itself");
            let back = self
                .partners
                .get(&partner.id)
                .unwrap_or_else(|| panic!("{id} -> {} has no reverse entry", partner.id));
            assert_eq!(&back.id, id, "partnership of {id} is not symmetric");
            assert_eq!(back.room_id, partner.room_id, "partners of {id} disagree on room");
        }
    }

    fn debug_check(&self) {
        if cfg!(debug_assertions) {
            self.assert_invariants();
        }
    }

    fn next_room_id(&self) -> RoomId {
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "{}_{}_{}",
            self.room_prefix,
            Utc::now().timestamp_millis(),
            &suffix[..8]
        )
    }

    fn pair(&mut self, a: &str, b: &str, room_id: &str) {
        self.partners.insert(
            a.to_string(),
            Partner {
                id: b.to_string(),
                room_id: room_id.to_string(),
            },
        );
        self.partners.insert(
            b.to_string(),
            Partner {
                id: a.to_string(),
                room_id: room_id.to_string(),
            },
        );
    }

    /// Removes both directions of the partnership `id` belongs to.
    fn unpair(&mut self, id: &str) -> Option<Partner> {
        let partner = self.partners.remove(id)?;
        self.partners.remove(&partner.id);
        Some(partner)
    }

    fn notify_and_unpair(&mut self, id: &str) -> Vec<Delivery> {
        match self.unpair(id) {
            Some(partner) => {
                info!(connection = %id, partner = %partner.id, room = %partner.room_id, "partnership ended");
                vec![Delivery::new(partner.id, ServerMessage::PartnerLeft)]
            }
            None => Vec::new(),
        }
    }

    fn enqueue(&mut self, topic: &str, id: &str) {
        let queue = self.queues.entry(topic.to_string()).or_default();
        if queue.push(id.to_string()) {
            self.queued_under.insert(id.to_string(), topic.to_string());
        }
    }

    fn dequeue(&mut self, id: &str) {
        let Some(topic) = self.queued_under.remove(id) else {
            return;
        };
        if let Some(queue) = self.queues.get_mut(&topic) {
            queue.remove(id);
            if queue.is_empty() {
                self.queues.remove(&topic);
            }
        }
    }

    fn pop_oldest(&mut self, topic: &str) -> Option<ConnectionId> {
        let queue = self.queues.get_mut(topic)?;
        let id = queue.pop_oldest();
        if queue.is_empty() {
            self.queues.remove(topic);
        }
        if let Some(id) = &id {
            self.queued_under.remove(id);
        }
        id
    }
}
