//! Matchmaking engine
//!
//! Pairs connections waiting under the same topic, strictly oldest first, and
//! tracks which two connections currently share a room. It is the only writer
//! of queue and partnership state.

pub mod engine;
pub mod queue;

pub use engine::{Matchmaker, Partner, Stats};
pub use queue::TopicQueue;
