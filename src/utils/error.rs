//! Error type shared by every layer of the service.
//!
//! The first three variants are user-facing: their `Display` text is the
//! stable `reason` sent back in a `validation-error` frame.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing_topic")]
    MissingTopic,

    #[error("malformed_message")]
    MalformedMessage(#[source] serde_json::Error),

    #[error("server_at_capacity")]
    AtCapacity(usize),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
