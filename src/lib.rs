//! # PeerLink
//!
//! `peerlink` pairs anonymous participants who ask for the same topic and
//! relays the signaling messages they need to open a direct peer-to-peer
//! channel. All state lives in memory in a single process.
//!
//! ## Core Modules
//!
//! - `client`: a connected participant, the live-client table and the
//!   `ConnectionRegistry` capability.
//! - `matchmaker`: topic queues, FIFO pairing and the partner map.
//! - `relay`: room membership and forwarding of offers, answers, candidates,
//!   chat and hangups.
//! - `hub`: ties the above together behind one lock and turns inbound
//!   messages into outbound deliveries.
//! - `transport`: the JSON wire protocol and the WebSocket server.
//! - `config`: loading settings from defaults, files and the environment.
//! - `utils`: error type and logging setup.

pub mod client;
pub mod config;
pub mod hub;
pub mod matchmaker;
pub mod relay;
pub mod transport;
pub mod utils;

pub use hub::Hub;
