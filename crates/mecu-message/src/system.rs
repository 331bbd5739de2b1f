//! System-class variants.

use mecu_frame::{CommandCode, Frame, MessageClass, MessageKind, SystemCommand};

use crate::error::Result;
use crate::variant::MessageVariant;

const fn system(command: SystemCommand) -> MessageKind {
    MessageKind::new(MessageClass::System, CommandCode::System(command))
}

/// Ask the ECU for its identification block. Carries no payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetEcuInfo {
    frame: Frame,
}

impl MessageVariant for GetEcuInfo {
    const KIND: MessageKind = system(SystemCommand::GetEcuInfo);
    const NAME: &'static str = "GetEcuInfo";

    fn wrap(frame: Frame) -> Self {
        Self { frame }
    }

    fn process_payload(&mut self) -> Result<()> {
        Ok(())
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn into_frame(self) -> Frame {
        self.frame
    }
}

/// Firmware hash granularity requested by [`GetHash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HashMode {
    Overall = 0x00,
    Detailed = 0x01,
}

impl HashMode {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::Overall),
            0x01 => Some(Self::Detailed),
            _ => None,
        }
    }
}

/// Ask the ECU for its firmware hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetHash {
    frame: Frame,
}

impl GetHash {
    pub fn with_mode(mode: HashMode) -> Self {
        let mut message = Self::request();
        message.set_mode(mode);
        message
    }

    /// Replace the payload with the single mode byte.
    pub fn set_mode(&mut self, mode: HashMode) {
        self.frame.set_payload_u8(mode.code());
    }

    /// The requested mode, if the payload starts with a known one.
    pub fn mode(&self) -> Option<HashMode> {
        self.frame
            .payload()
            .first()
            .and_then(|code| HashMode::from_code(*code))
    }
}

impl MessageVariant for GetHash {
    const KIND: MessageKind = system(SystemCommand::GetHash);
    const NAME: &'static str = "GetHash";

    fn wrap(frame: Frame) -> Self {
        Self { frame }
    }

    fn process_payload(&mut self) -> Result<()> {
        Ok(())
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn into_frame(self) -> Frame {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use mecu_frame::MessageType;

    use super::*;
    use crate::error::MessageError;

    #[test]
    fn get_ecu_info_request() {
        let message = GetEcuInfo::request();
        assert_eq!(message.to_hex(), "4d4500000004000408");
        assert_eq!(message.frame().message_type(), MessageType::Request);
    }

    #[test]
    fn get_hash_modes() {
        assert_eq!(
            GetHash::with_mode(HashMode::Detailed).to_hex(),
            "4d45010000040101060f"
        );
        assert_eq!(
            GetHash::with_mode(HashMode::Overall).to_hex(),
            "4d45010000040100050e"
        );
    }

    #[test]
    fn set_mode_replaces_payload() {
        let mut message = GetHash::request();
        assert_eq!(message.mode(), None);
        message.set_mode(HashMode::Overall);
        message.set_mode(HashMode::Detailed);
        assert_eq!(message.frame().payload().as_ref(), &[0x01]);
        assert_eq!(message.mode(), Some(HashMode::Detailed));
    }

    #[test]
    fn from_frame_rejects_other_kinds() {
        let frame = GetEcuInfo::request().into_frame();
        let err = GetHash::from_frame(frame).unwrap_err();
        assert!(matches!(
            err,
            MessageError::KindMismatch {
                variant: "GetHash",
                ..
            }
        ));
    }

    #[test]
    fn response_payload_is_kept_verbatim() {
        let frame = Frame::for_kind(MessageType::Response, GetEcuInfo::KIND)
            .with_payload(b"ME442 v1.2".to_vec())
            .unwrap();
        let message = GetEcuInfo::from_frame(frame.clone()).unwrap();
        assert_eq!(message.frame(), &frame);
    }
}
