use std::fmt;
use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::checksum::frame_checksum;
use crate::error::{FrameError, Result};
use crate::taxonomy::{CommandCode, MessageClass, MessageKind, MessageType};

/// Frame header: magic (2) + length (2) + type (1) + class (1) + command (1) = 7 bytes.
pub const HEADER_SIZE: usize = 7;

/// Trailing checksum size.
pub const CHECKSUM_SIZE: usize = 2;

/// Smallest possible frame (empty payload).
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + CHECKSUM_SIZE;

/// Magic bytes: "ME" (0x4D 0x45).
pub const MAGIC: [u8; 2] = *b"ME";

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// What decode does when the wire checksum disagrees with the recomputed one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChecksumPolicy {
    /// Fail with [`FrameError::ChecksumMismatch`].
    #[default]
    Reject,
    /// Log a warning and keep the frame (with the recomputed checksum).
    Warn,
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum accepted payload size in bytes. Default: 65535.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations. `None` blocks until a full frame arrives.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
    /// Handling of wire checksums that fail verification.
    pub checksum_policy: ChecksumPolicy,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
            checksum_policy: ChecksumPolicy::default(),
        }
    }
}

/// One complete protocol message.
///
/// The checksum is owned by the frame: it is recomputed on every mutation
/// and can't be set from outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    message_type: MessageType,
    message_class: MessageClass,
    command: CommandCode,
    payload: Bytes,
    checksum: u16,
}

impl Frame {
    /// Create a new frame.
    pub fn new(
        message_type: MessageType,
        message_class: MessageClass,
        command: impl Into<CommandCode>,
        payload: impl Into<Bytes>,
    ) -> Result<Self> {
        let kind = MessageKind::new(message_class, command.into());
        let mut frame = Self::for_kind(message_type, kind);
        frame.set_payload(payload)?;
        Ok(frame)
    }

    /// Empty-payload frame of the given kind.
    pub fn for_kind(message_type: MessageType, kind: MessageKind) -> Self {
        let mut frame = Self {
            message_type,
            message_class: kind.class(),
            command: kind.command(),
            payload: Bytes::new(),
            checksum: 0,
        };
        frame.refresh_checksum();
        frame
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn message_class(&self) -> MessageClass {
        self.message_class
    }

    pub fn command(&self) -> CommandCode {
        self.command
    }

    /// The `(class, command)` dispatch key.
    pub fn kind(&self) -> MessageKind {
        MessageKind::new(self.message_class, self.command)
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Payload length as carried in the header.
    pub fn length(&self) -> u16 {
        // set_payload bounds the payload to MAX_PAYLOAD.
        self.payload.len() as u16
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    /// Replace the payload.
    pub fn set_payload(&mut self, payload: impl Into<Bytes>) -> Result<()> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD,
            });
        }
        self.payload = payload;
        self.refresh_checksum();
        Ok(())
    }

    /// Replace the payload with a single byte.
    pub fn set_payload_u8(&mut self, value: u8) {
        self.payload = Bytes::copy_from_slice(&[value]);
        self.refresh_checksum();
    }

    /// Builder form of [`Frame::set_payload`].
    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Result<Self> {
        self.set_payload(payload)?;
        Ok(self)
    }

    pub fn set_message_type(&mut self, message_type: MessageType) {
        self.message_type = message_type;
        self.refresh_checksum();
    }

    /// Overwrite the header codes, keeping the payload.
    pub fn set_kind(&mut self, kind: MessageKind) {
        self.message_class = kind.class();
        self.command = kind.command();
        self.refresh_checksum();
    }

    /// The total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        MIN_FRAME_SIZE + self.payload.len()
    }

    /// Append the wire form of this frame to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        encode_frame(self, dst);
    }

    /// Wire form of this frame.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        encode_frame(self, &mut buf);
        buf.freeze()
    }

    /// Lowercase hex of the wire form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Decode one frame from a complete buffer with the default config.
    pub fn decode(src: &[u8]) -> Result<Self> {
        Self::decode_with_config(src, &FrameConfig::default())
    }

    /// Decode one frame from a complete buffer.
    ///
    /// Bytes past the end of the frame are ignored.
    pub fn decode_with_config(src: &[u8], config: &FrameConfig) -> Result<Self> {
        if src.len() < MAGIC.len() {
            return Err(FrameError::TruncatedPayload {
                needed: MIN_FRAME_SIZE,
                available: src.len(),
            });
        }
        check_magic(src)?;
        if src.len() < HEADER_SIZE {
            return Err(FrameError::TruncatedPayload {
                needed: MIN_FRAME_SIZE,
                available: src.len(),
            });
        }

        let header = RawHeader::parse(src);
        let length = header.checked_length(config)?;
        let total = HEADER_SIZE + length + CHECKSUM_SIZE;
        if src.len() < total {
            return Err(FrameError::TruncatedPayload {
                needed: total,
                available: src.len(),
            });
        }
        if src.len() > total {
            tracing::debug!(trailing = src.len() - total, "ignoring bytes after frame");
        }

        let payload = Bytes::copy_from_slice(&src[HEADER_SIZE..HEADER_SIZE + length]);
        let declared = u16::from_le_bytes([src[total - 2], src[total - 1]]);
        header.into_frame(payload, declared, config)
    }

    /// Decode one frame from a hex string (whitespace is ignored).
    pub fn from_hex(input: &str) -> Result<Self> {
        let compact: String = input.split_whitespace().collect();
        let bytes = hex::decode(compact)?;
        Self::decode(&bytes)
    }

    fn refresh_checksum(&mut self) {
        self.checksum = frame_checksum(
            self.message_type.code(),
            self.message_class.code(),
            self.command.code(),
            &self.payload,
        );
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame(type: {}, class: {}, command: {}, len: {})",
            self.message_type,
            self.message_class,
            self.command,
            self.length()
        )
    }
}

/// Header fields as they appear on the wire, before resolution.
#[derive(Debug, Clone, Copy)]
struct RawHeader {
    length: u16,
    message_type: u8,
    message_class: u8,
    command: u8,
}

impl RawHeader {
    /// `src` must hold at least `HEADER_SIZE` bytes.
    fn parse(src: &[u8]) -> Self {
        Self {
            length: u16::from_le_bytes([src[2], src[3]]),
            message_type: src[4],
            message_class: src[5],
            command: src[6],
        }
    }

    fn checked_length(&self, config: &FrameConfig) -> Result<usize> {
        let length = usize::from(self.length);
        if length > config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: length,
                max: config.max_payload_size,
            });
        }
        Ok(length)
    }

    fn into_frame(self, payload: Bytes, declared: u16, config: &FrameConfig) -> Result<Frame> {
        let message_type = MessageType::from_code(self.message_type)?;
        let message_class = MessageClass::from_code(self.message_class)?;
        let command = CommandCode::resolve(message_class, self.command);
        if !command.is_known() {
            tracing::debug!(
                class = %message_class,
                command = self.command,
                "command has no name under its class; keeping raw code"
            );
        }

        let computed = frame_checksum(
            self.message_type,
            self.message_class,
            self.command,
            &payload,
        );
        if declared != computed {
            match config.checksum_policy {
                ChecksumPolicy::Reject => {
                    return Err(FrameError::ChecksumMismatch { declared, computed });
                }
                ChecksumPolicy::Warn => {
                    tracing::warn!(
                        declared,
                        computed,
                        "frame checksum mismatch; keeping recomputed value"
                    );
                }
            }
        }

        Ok(Frame {
            message_type,
            message_class,
            command,
            payload,
            checksum: computed,
        })
    }
}

fn check_magic(src: &[u8]) -> Result<()> {
    if src[0..2] != MAGIC {
        return Err(FrameError::MalformedFrame {
            found: [src[0], src[1]],
        });
    }
    Ok(())
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬──────────┬──────┬───────┬─────────┬──────────────┬──────────┐
/// │ Magic (2B) │ Length   │ Type │ Class │ Command │ Payload      │ Checksum │
/// │ "ME"       │ (2B LE)  │ (1B) │ (1B)  │ (1B)    │ (Length B)   │ (2B LE)  │
/// └────────────┴──────────┴──────┴───────┴─────────┴──────────────┴──────────┘
/// ```
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) {
    let checksum = frame_checksum(
        frame.message_type.code(),
        frame.message_class.code(),
        frame.command.code(),
        &frame.payload,
    );
    debug_assert_eq!(checksum, frame.checksum);

    dst.reserve(frame.wire_size());
    dst.put_slice(&MAGIC);
    dst.put_u16_le(frame.length());
    dst.put_u8(frame.message_type.code());
    dst.put_u8(frame.message_class.code());
    dst.put_u8(frame.command.code());
    dst.put_slice(&frame.payload);
    dst.put_u16_le(checksum);
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer. A frame whose
/// header codes or checksum are rejected is consumed as well, so the
/// stream stays aligned on the next frame.
pub fn decode_frame(src: &mut BytesMut, config: &FrameConfig) -> Result<Option<Frame>> {
    if src.len() < MAGIC.len() {
        return Ok(None); // Need more data
    }
    check_magic(&src[..])?;
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let header = RawHeader::parse(&src[..HEADER_SIZE]);
    let length = header.checked_length(config)?;
    let total = HEADER_SIZE + length + CHECKSUM_SIZE;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(length).freeze();
    let declared = src.get_u16_le();

    header.into_frame(payload, declared, config).map(Some)
}
