//! The `utils` module provides shared definitions used across `peerlink`:
//! the crate error type and logging initialization.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
