use std::collections::{BTreeSet, HashMap};

use crate::client::ConnectionId;
use crate::transport::message::RoomId;

/// Which connections currently occupy which room.
///
/// Rooms are created by the first `join` and dropped once their last member
/// leaves.
#[derive(Debug, Default)]
pub struct Rooms {
    members: HashMap<RoomId, BTreeSet<ConnectionId>>,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, room_id: &str, id: &str) {
        self.members
            .entry(room_id.to_string())
            .or_default()
            .insert(id.to_string());
    }

    /// Everyone in `room_id` except `id`.
    pub fn others(&self, room_id: &str, id: &str) -> Vec<ConnectionId> {
        self.members
            .get(room_id)
            .map(|m| m.iter().filter(|member| *member != id).cloned().collect())
            .unwrap_or_default()
    }

    pub fn members(&self, room_id: &str) -> Vec<ConnectionId> {
        self.members
            .get(room_id)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, room_id: &str, id: &str) -> bool {
        self.members.get(room_id).is_some_and(|m| m.contains(id))
    }

    /// Removes the room and returns whoever was in it.
    pub fn evict(&mut self, room_id: &str) -> Vec<ConnectionId> {
        self.members
            .remove(room_id)
            .map(|m| m.into_iter().collect())
            .unwrap_or_default()
    }

    /// Takes `id` out of every room it occupies.
    pub fn leave_all(&mut self, id: &str) {
        self.members.retain(|_, m| {
            m.remove(id);
            !m.is_empty()
        });
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
