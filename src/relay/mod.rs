//! Signaling relay
//!
//! Forwards offers, answers, network-path candidates and chat text between
//! matched connections. Routing comes from each message: an explicit target
//! connection, or a room whose other occupants receive it. The relay never
//! looks at partnership state or at the payloads it carries.

pub mod rooms;
pub mod signal;

pub use rooms::Rooms;
pub use signal::{SignalKind, forward_chat, forward_signal, hangup};

#[cfg(test)]
mod tests;
