//! Reporting entity descriptors and the values decoded against them.

use std::fmt;

use mecu_frame::ReportingValueType;

use crate::error::{MessageError, Result};

/// One row of the ECU's reporting entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReportingEntityDescriptor {
    pub id: u16,
    pub value_type: ReportingValueType,
}

impl ReportingEntityDescriptor {
    pub const fn new(id: u16, value_type: ReportingValueType) -> Self {
        Self { id, value_type }
    }

    /// Bytes this entity occupies in a report payload.
    pub fn byte_width(&self) -> usize {
        self.value_type.byte_width()
    }
}

impl fmt::Display for ReportingEntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.id, self.value_type.name())
    }
}

/// A decoded reporting value, tagged with its wire type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportingValue {
    Float32(f32),
    Int16(i16),
    UInt16(u16),
    Int8(i8),
    UInt8(u8),
    Bool(bool),
}

impl ReportingValue {
    /// Decode one value. `bytes` must hold exactly `value_type.byte_width()` bytes.
    fn read_le(value_type: ReportingValueType, bytes: &[u8]) -> Self {
        match value_type {
            ReportingValueType::Float32 => {
                Self::Float32(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            ReportingValueType::Int16 => Self::Int16(i16::from_le_bytes([bytes[0], bytes[1]])),
            ReportingValueType::UInt16 => Self::UInt16(u16::from_le_bytes([bytes[0], bytes[1]])),
            ReportingValueType::Int8 => Self::Int8(i8::from_le_bytes([bytes[0]])),
            ReportingValueType::UInt8 => Self::UInt8(bytes[0]),
            ReportingValueType::Bool8 => Self::Bool(bytes[0] != 0),
        }
    }

    pub fn value_type(&self) -> ReportingValueType {
        match self {
            Self::Float32(_) => ReportingValueType::Float32,
            Self::Int16(_) => ReportingValueType::Int16,
            Self::UInt16(_) => ReportingValueType::UInt16,
            Self::Int8(_) => ReportingValueType::Int8,
            Self::UInt8(_) => ReportingValueType::UInt8,
            Self::Bool(_) => ReportingValueType::Bool8,
        }
    }

    /// Numeric view, with booleans as 0 or 1.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Float32(v) => f64::from(v),
            Self::Int16(v) => f64::from(v),
            Self::UInt16(v) => f64::from(v),
            Self::Int8(v) => f64::from(v),
            Self::UInt8(v) => f64::from(v),
            Self::Bool(v) => f64::from(u8::from(v)),
        }
    }
}

impl fmt::Display for ReportingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float32(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::UInt8(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// A value paired with the descriptor it was decoded against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportingEntityValue {
    pub descriptor: ReportingEntityDescriptor,
    pub value: ReportingValue,
}

impl ReportingEntityValue {
    pub fn id(&self) -> u16 {
        self.descriptor.id
    }
}

impl fmt::Display for ReportingEntityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} = {}", self.descriptor.id, self.value)
    }
}

/// Decode packed little-endian values, one per descriptor, in order.
///
/// The whole width is checked before anything is decoded, so a short
/// payload never yields a partial list.
pub(crate) fn decode_values(
    variant: &'static str,
    data: &[u8],
    descriptors: &[ReportingEntityDescriptor],
) -> Result<Vec<ReportingEntityValue>> {
    let needed: usize = descriptors.iter().map(|d| d.byte_width()).sum();
    if data.len() < needed {
        return Err(MessageError::TruncatedPayload {
            variant,
            needed,
            available: data.len(),
        });
    }
    if data.len() > needed {
        tracing::debug!(
            extra = data.len() - needed,
            "report carries bytes past the last described entity"
        );
    }

    let mut offset = 0;
    let values = descriptors
        .iter()
        .map(|descriptor| {
            let width = descriptor.byte_width();
            let value =
                ReportingValue::read_le(descriptor.value_type, &data[offset..offset + width]);
            offset += width;
            ReportingEntityValue {
                descriptor: *descriptor,
                value,
            }
        })
        .collect();
    Ok(values)
}
