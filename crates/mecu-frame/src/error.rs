use crate::taxonomy::UnresolvedCode;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame does not start with the "ME" magic marker.
    #[error("malformed frame: expected magic \"ME\", found {found:02x?}")]
    MalformedFrame { found: [u8; 2] },

    /// The type or class byte is outside its closed code set.
    #[error(transparent)]
    UnresolvedCode(#[from] UnresolvedCode),

    /// The buffer ends before the declared payload and checksum.
    #[error("truncated frame ({available} bytes available, {needed} needed)")]
    TruncatedPayload { needed: usize, available: usize },

    /// The checksum on the wire differs from the recomputed one.
    #[error("checksum mismatch (declared 0x{declared:04x}, computed 0x{computed:04x})")]
    ChecksumMismatch { declared: u16, computed: u16 },

    /// The payload exceeds the configured (or representable) maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Frame text input was not valid hex.
    #[error("invalid hex input: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
