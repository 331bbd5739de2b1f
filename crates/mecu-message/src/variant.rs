use bytes::Bytes;
use mecu_frame::{Frame, MessageKind, MessageType};

use crate::error::{MessageError, Result};
use crate::message::Message;

/// A concrete message type bound to one `(class, command)` pair.
///
/// Implementors wrap a [`Frame`] and interpret its payload. Registering a
/// new implementor with a [`MessageRegistry`](crate::MessageRegistry) is all
/// it takes for dispatch to produce it; nothing else in this crate changes.
pub trait MessageVariant: Sized + Into<Message> {
    /// The kind this variant answers to.
    const KIND: MessageKind;

    /// Human-readable variant name, used in logs and `Display`.
    const NAME: &'static str;

    /// Wrap a frame without interpreting its payload.
    ///
    /// Variants that pin header fields enforce them here.
    fn wrap(frame: Frame) -> Self;

    /// Interpret the payload of the wrapped frame.
    fn process_payload(&mut self) -> Result<()>;

    fn frame(&self) -> &Frame;

    fn into_frame(self) -> Frame;

    /// A fresh REQUEST of this variant with an empty payload.
    fn request() -> Self {
        Self::wrap(Frame::for_kind(MessageType::Request, Self::KIND))
    }

    /// Build the variant from a decoded frame of the same kind.
    fn from_frame(frame: Frame) -> Result<Self> {
        if frame.kind() != Self::KIND {
            return Err(MessageError::KindMismatch {
                variant: Self::NAME,
                expected: Self::KIND,
                found: frame.kind(),
            });
        }
        let mut variant = Self::wrap(frame);
        variant.process_payload()?;
        Ok(variant)
    }

    fn to_bytes(&self) -> Bytes {
        self.frame().to_bytes()
    }

    fn to_hex(&self) -> String {
        self.frame().to_hex()
    }
}
