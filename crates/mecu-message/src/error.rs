use mecu_frame::{FrameError, MessageKind, UnresolvedCode};

/// Errors that can occur while interpreting a frame as a message.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// A payload field holds a code outside its set.
    #[error(transparent)]
    UnresolvedCode(#[from] UnresolvedCode),

    /// The payload is shorter than its own contents declare.
    #[error("{variant} payload truncated ({available} bytes available, {needed} needed)")]
    TruncatedPayload {
        variant: &'static str,
        needed: usize,
        available: usize,
    },

    /// A frame was handed to a variant of a different kind.
    #[error("{variant} expects {expected}, frame is {found}")]
    KindMismatch {
        variant: &'static str,
        expected: MessageKind,
        found: MessageKind,
    },

    /// A variant was registered twice for the same kind.
    #[error("{kind} is already registered to {existing}")]
    DuplicateKind {
        kind: MessageKind,
        existing: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, MessageError>;
