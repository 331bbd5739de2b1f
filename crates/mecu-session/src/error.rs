use std::io::ErrorKind;

use mecu_frame::{FrameError, MessageKind};
use mecu_message::MessageError;

/// Errors that can occur during a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] mecu_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Payload interpretation error.
    #[error("message error: {0}")]
    Message(#[from] MessageError),

    /// Too many unrelated frames arrived while waiting for a reply.
    #[error("no {expected} reply after {skipped} unrelated frames")]
    NoReply { expected: MessageKind, skipped: usize },

    /// A report arrived before any entity table was received.
    #[error("reporting is not enabled")]
    ReportingDisabled,
}

impl SessionError {
    /// Whether the error is a read or write timeout on the underlying stream.
    pub fn is_timeout(&self) -> bool {
        let frame = match self {
            Self::Frame(err) => err,
            Self::Message(MessageError::Frame(err)) => err,
            _ => return false,
        };
        matches!(frame, FrameError::Io(io) if matches!(io.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock))
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
