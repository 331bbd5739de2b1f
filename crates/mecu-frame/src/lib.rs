//! Frame codec, checksum and code taxonomy for the ME ECU serial protocol.
//!
//! Every message on the wire is framed as:
//! - A 2-byte magic marker ("ME")
//! - A 2-byte little-endian payload length
//! - One byte each for message type, message class and command
//! - The payload
//! - A 2-byte little-endian Fletcher-style checksum
//!
//! The checksum covers the type, class and command bytes plus the payload,
//! never the magic or the length.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod reader;
pub mod taxonomy;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::EcuCodec;
pub use checksum::{checksum, frame_checksum, Checksum};
pub use codec::{
    decode_frame, encode_frame, ChecksumPolicy, Frame, FrameConfig, CHECKSUM_SIZE, HEADER_SIZE,
    MAGIC, MAX_PAYLOAD, MIN_FRAME_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use taxonomy::{
    CodeFamily, CommandCode, CommandSet, MessageClass, MessageKind, MessageType,
    ReportingCommand, ReportingValueType, SystemCommand, UnknownName, UnresolvedCode,
    ValueTypeSpec,
};
pub use writer::FrameWriter;
