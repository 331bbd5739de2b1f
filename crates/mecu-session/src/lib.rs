//! Conversation layer for talking to an ECU.
//!
//! A [`Session`] pairs a frame reader and writer, dispatches everything it
//! reads through a message registry, and holds the one piece of protocol
//! state that outlives a single frame: the entity table used to decode
//! reports.

pub mod error;
pub mod session;

pub use error::{Result, SessionError};
pub use session::{Report, Session, SessionConfig};
