//! Reporting-class variants and the entity table they negotiate.
//!
//! Flow: the host sends `SetState(true)`; the ECU answers with its entity
//! table; every `SendReport` after that is a packed row of values in table
//! order, each acknowledged with a `SendAck`.

use mecu_frame::{
    CommandCode, Frame, MessageClass, MessageKind, MessageType, ReportingCommand,
    ReportingValueType,
};

use crate::entity::{decode_values, ReportingEntityDescriptor, ReportingEntityValue};
use crate::error::{MessageError, Result};
use crate::variant::MessageVariant;

const fn reporting(command: ReportingCommand) -> MessageKind {
    MessageKind::new(MessageClass::Reporting, CommandCode::Reporting(command))
}

/// Entity table layout revision, inferred from the response length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportingVersion {
    /// Single status byte, no table.
    V1,
    /// Status byte, link count, then `(id, type)` triples.
    V2,
}

/// The ECU's answer to `SetState`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntityTable {
    pub version: Option<ReportingVersion>,
    pub link_count: u16,
    pub entities: Vec<ReportingEntityDescriptor>,
}

impl EntityTable {
    const ENTRY_SIZE: usize = 3;
    const V2_HEADER: usize = 3;

    /// Parse a `SetState` response payload.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() == 1 {
            return Ok(Self {
                version: Some(ReportingVersion::V1),
                ..Self::default()
            });
        }

        if payload.len() < Self::V2_HEADER {
            return Err(truncated(Self::V2_HEADER, payload.len()));
        }
        let link_count = u16::from_le_bytes([payload[1], payload[2]]);
        let needed = Self::V2_HEADER + usize::from(link_count) * Self::ENTRY_SIZE;
        if payload.len() < needed {
            return Err(truncated(needed, payload.len()));
        }

        let entities = payload[Self::V2_HEADER..needed]
            .chunks_exact(Self::ENTRY_SIZE)
            .map(|entry| {
                Ok(ReportingEntityDescriptor {
                    id: u16::from_le_bytes([entry[0], entry[1]]),
                    value_type: ReportingValueType::from_code(entry[2])?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            version: Some(ReportingVersion::V2),
            link_count,
            entities,
        })
    }

    /// Total bytes one report row occupies.
    pub fn report_width(&self) -> usize {
        self.entities.iter().map(|e| e.byte_width()).sum()
    }
}

fn truncated(needed: usize, available: usize) -> MessageError {
    MessageError::TruncatedPayload {
        variant: SetState::NAME,
        needed,
        available,
    }
}

/// Enable or disable streaming; the response carries the entity table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetState {
    frame: Frame,
    table: EntityTable,
}

impl SetState {
    pub fn enable(enabled: bool) -> Self {
        let mut message = Self::request();
        message.set_enabled(enabled);
        message
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.frame.set_payload_u8(u8::from(enabled));
    }

    /// The requested state, read from the first payload byte.
    pub fn enabled(&self) -> Option<bool> {
        self.frame.payload().first().map(|b| *b != 0)
    }

    /// Entity table parsed from a response. Empty for requests.
    pub fn table(&self) -> &EntityTable {
        &self.table
    }

    pub fn entities(&self) -> &[ReportingEntityDescriptor] {
        &self.table.entities
    }

    pub fn version(&self) -> Option<ReportingVersion> {
        self.table.version
    }

    pub fn into_table(self) -> EntityTable {
        self.table
    }
}

impl MessageVariant for SetState {
    const KIND: MessageKind = reporting(ReportingCommand::SetState);
    const NAME: &'static str = "SetState";

    fn wrap(frame: Frame) -> Self {
        Self {
            frame,
            table: EntityTable::default(),
        }
    }

    fn process_payload(&mut self) -> Result<()> {
        if self.frame.message_type() == MessageType::Response {
            self.table = EntityTable::decode(self.frame.payload())?;
            tracing::debug!(
                version = ?self.table.version,
                entities = self.table.entities.len(),
                "entity table received"
            );
        }
        Ok(())
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn into_frame(self) -> Frame {
        self.frame
    }
}

/// Acknowledge a report. Always a REQUEST with a single zero byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendAck {
    frame: Frame,
}

impl MessageVariant for SendAck {
    const KIND: MessageKind = reporting(ReportingCommand::SendAck);
    const NAME: &'static str = "SendAck";

    fn wrap(mut frame: Frame) -> Self {
        frame.set_message_type(MessageType::Request);
        frame.set_kind(Self::KIND);
        frame.set_payload_u8(0x00);
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

/// One row of streamed values.
///
/// The payload can only be interpreted against the entity table the session
/// received earlier, so decoding is deferred to [`SendReport::parse_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    frame: Frame,
}

impl SendReport {
    /// Decode values in descriptor order. The leading sequence byte is skipped.
    pub fn parse_report(
        &self,
        descriptors: &[ReportingEntityDescriptor],
    ) -> Result<Vec<ReportingEntityValue>> {
        let data = self.frame.payload().get(1..).unwrap_or_default();
        decode_values(Self::NAME, data, descriptors)
    }

    /// Leading payload byte; the ECU increments it per report.
    pub fn sequence(&self) -> Option<u8> {
        self.frame.payload().first().copied()
    }
}

impl MessageVariant for SendReport {
    const KIND: MessageKind = reporting(ReportingCommand::SendReport);
    const NAME: &'static str = "SendReport";

    fn wrap(frame: Frame) -> Self {
        Self { frame }
    }

    fn request() -> Self {
        let mut frame = Frame::for_kind(MessageType::Request, Self::KIND);
        frame.set_payload_u8(0x00);
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
    use mecu_frame::{MessageType, UnresolvedCode};

    use super::*;
    use crate::entity::ReportingValue;

    fn response(kind: MessageKind, payload: &[u8]) -> Frame {
        Frame::for_kind(MessageType::Response, kind)
            .with_payload(payload.to_vec())
            .unwrap()
    }

    #[test]
    fn set_state_requests() {
        assert_eq!(SetState::enable(true).to_hex(), "4d450100000002010305");
        assert_eq!(SetState::enable(false).to_hex(), "4d450100000002000204");
    }

    #[test]
    fn set_enabled_toggles() {
        let mut message = SetState::request();
        assert_eq!(message.enabled(), None);
        message.set_enabled(true);
        assert_eq!(message.enabled(), Some(true));
        message.set_enabled(false);
        assert_eq!(message.frame().payload().as_ref(), &[0x00]);
    }

    #[test]
    fn request_payload_is_not_a_table() {
        let message = SetState::from_frame(SetState::enable(true).into_frame()).unwrap();
        assert_eq!(message.version(), None);
        assert!(message.entities().is_empty());
    }

    #[test]
    fn v1_response_has_no_entities() {
        let frame = response(SetState::KIND, &[0x01]);
        let message = SetState::from_frame(frame).unwrap();
        assert_eq!(message.version(), Some(ReportingVersion::V1));
        assert_eq!(message.table().link_count, 0);
        assert!(message.entities().is_empty());
    }

    #[test]
    fn v2_response_lists_entities() {
        let frame = response(
            SetState::KIND,
            &[0x01, 0x02, 0x00, 0x01, 0x00, 0x02, 0x0E, 0x00, 0x03],
        );
        let message = SetState::from_frame(frame).unwrap();
        assert_eq!(message.version(), Some(ReportingVersion::V2));
        assert_eq!(message.table().link_count, 2);
        assert_eq!(
            message.entities(),
            &[
                ReportingEntityDescriptor::new(1, ReportingValueType::UInt16),
                ReportingEntityDescriptor::new(14, ReportingValueType::Int8),
            ]
        );
        assert_eq!(message.table().report_width(), 3);
    }

    #[test]
    fn v2_response_shorter_than_link_count() {
        let frame = response(SetState::KIND, &[0x01, 0x02, 0x00, 0x01, 0x00, 0x02]);
        let err = SetState::from_frame(frame).unwrap_err();
        assert!(matches!(
            err,
            MessageError::TruncatedPayload {
                variant: "SetState",
                needed: 9,
                available: 6,
            }
        ));
    }

    #[test]
    fn v2_response_without_link_count() {
        let err = EntityTable::decode(&[0x01, 0x02]).unwrap_err();
        assert!(matches!(
            err,
            MessageError::TruncatedPayload {
                needed: 3,
                available: 2,
                ..
            }
        ));
    }

    #[test]
    fn unknown_value_type_in_table() {
        let err = EntityTable::decode(&[0x01, 0x01, 0x00, 0x05, 0x00, 0x09]).unwrap_err();
        assert!(matches!(
            err,
            MessageError::UnresolvedCode(UnresolvedCode { code: 0x09, .. })
        ));
    }

    #[test]
    fn send_ack_overrides_header() {
        assert_eq!(SendAck::request().to_hex(), "4d450100000001000102");

        let frame = response(SendAck::KIND, &[0x07, 0x08]);
        let ack = SendAck::from_frame(frame).unwrap();
        assert_eq!(ack.frame().message_type(), MessageType::Request);
        assert_eq!(ack.frame().payload().as_ref(), &[0x00]);
        assert_eq!(ack.to_hex(), "4d450100000001000102");
    }

    #[test]
    fn send_report_default_payload() {
        let report = SendReport::request();
        assert_eq!(report.frame().payload().as_ref(), &[0x00]);
        assert_eq!(report.sequence(), Some(0));
    }

    #[test]
    fn parse_report_in_table_order() {
        let descriptors = [
            ReportingEntityDescriptor::new(1, ReportingValueType::UInt16),
            ReportingEntityDescriptor::new(14, ReportingValueType::Int8),
        ];
        let frame = response(SendReport::KIND, &[0x2A, 0x34, 0x12, 0xFE]);
        let report = SendReport::from_frame(frame).unwrap();

        let values = report.parse_report(&descriptors).unwrap();
        assert_eq!(report.sequence(), Some(0x2A));
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].id(), 1);
        assert_eq!(values[0].value, ReportingValue::UInt16(0x1234));
        assert_eq!(values[1].id(), 14);
        assert_eq!(values[1].value, ReportingValue::Int8(-2));
    }

    #[test]
    fn parse_report_one_byte_short() {
        let descriptors = [
            ReportingEntityDescriptor::new(1, ReportingValueType::UInt16),
            ReportingEntityDescriptor::new(14, ReportingValueType::Int8),
        ];
        let frame = response(SendReport::KIND, &[0x2A, 0x34, 0x12]);
        let report = SendReport::from_frame(frame).unwrap();

        let err = report.parse_report(&descriptors).unwrap_err();
        assert!(matches!(
            err,
            MessageError::TruncatedPayload {
                variant: "SendReport",
                needed: 3,
                available: 2,
            }
        ));
    }

    #[test]
    fn parse_report_accepts_request_direction() {
        let descriptors = [ReportingEntityDescriptor::new(3, ReportingValueType::Bool8)];
        let mut frame = SendReport::request().into_frame();
        frame.set_payload(vec![0x00, 0x01]).unwrap();
        let report = SendReport::from_frame(frame).unwrap();
        let values = report.parse_report(&descriptors).unwrap();
        assert_eq!(values[0].value, ReportingValue::Bool(true));
    }
}
