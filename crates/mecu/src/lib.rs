//! Codec and serial tooling for the ME ECU binary protocol.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial byte stream (open, list ports)
//! - [`frame`]: wire framing, checksum and code taxonomy
//! - [`message`]: typed variants, registry dispatch, reporting payloads
//! - [`session`]: request/response and report streaming (behind `session` feature)

/// Re-export transport types.
pub mod transport {
    pub use mecu_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use mecu_frame::*;
}

/// Re-export message types.
pub mod message {
    pub use mecu_message::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use mecu_session::*;
}
