//! The `transport` module is responsible for network communication with
//! participants over WebSockets.
//!
//! It defines the JSON protocol spoken with clients and the server loop that
//! accepts connections and feeds their frames into the `Hub`.

pub mod message;
pub mod websocket;


pub use message::{ClientMessage, Delivery, RoomId, ServerMessage};
pub use websocket::{serve, start_websocket_server};
