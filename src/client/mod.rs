//! The `client` module defines the representation of a connected participant.
//!
//! It provides the `Client` struct, which pairs a connection identifier with the
//! channel used to push frames to it, the `Clients` table the hub keeps of every
//! live connection, and the `ConnectionRegistry` capability the matchmaker and
//! relay use to ask whether a connection is still reachable.

pub mod connection;
pub use connection::{Client, Clients, ConnectionId, ConnectionRegistry};
