use std::collections::VecDeque;

use crate::client::ConnectionId;

/// Connections waiting for a partner under one topic, oldest first.
#[derive(Debug, Default)]
pub struct TopicQueue {
    waiting: VecDeque<ConnectionId>,
}

impl TopicQueue {
    /// Appends `id` at the back. A connection already waiting keeps its place.
    pub fn push(&mut self, id: ConnectionId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.waiting.push_back(id);
        true
    }

    /// Takes the connection that has been waiting longest.
    pub fn pop_oldest(&mut self) -> Option<ConnectionId> {
        self.waiting.pop_front()
    }

    pub fn remove(&mut self, id: &str) -> bool {
        match self.waiting.iter().position(|w| w == id) {
            Some(idx) => {
                self.waiting.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.waiting.iter().any(|w| w == id)
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectionId> {
        self.waiting.iter()
    }
}
