//! TCP transport: listener, per-connection tasks and the wire protocol

pub mod handler;
pub mod listener;
pub mod protocol;

pub use listener::{Listener, ServerError};
