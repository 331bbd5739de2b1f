use std::any::Any;
use std::fmt;

use bytes::Bytes;
use mecu_frame::{Frame, MessageKind};

use crate::error::Result;
use crate::reporting::{SendAck, SendReport, SetState};
use crate::system::{GetEcuInfo, GetHash};
use crate::variant::MessageVariant;

/// Object-safe view of a variant defined outside this crate.
pub trait CustomVariant: fmt::Debug + Send + Sync + Any {
    fn variant_name(&self) -> &'static str;
    fn variant_frame(&self) -> &Frame;
    fn as_any(&self) -> &dyn Any;
}

impl<V> CustomVariant for V
where
    V: MessageVariant + fmt::Debug + Send + Sync + 'static,
{
    fn variant_name(&self) -> &'static str {
        V::NAME
    }

    fn variant_frame(&self) -> &Frame {
        self.frame()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A dispatched message.
#[derive(Debug)]
pub enum Message {
    GetEcuInfo(GetEcuInfo),
    GetHash(GetHash),
    SetState(SetState),
    SendAck(SendAck),
    SendReport(SendReport),
    /// A registered variant this crate doesn't know about.
    Custom(Box<dyn CustomVariant>),
    /// A valid frame with no registered variant.
    Generic(Frame),
}

impl Message {
    /// Decode and dispatch through the default registry.
    pub fn decode(src: &[u8]) -> Result<Self> {
        crate::registry::dispatch(src)
    }

    /// Decode hex text (whitespace ignored) through the default registry.
    pub fn from_hex(input: &str) -> Result<Self> {
        let frame = Frame::from_hex(input)?;
        crate::registry::default_registry().dispatch_frame(frame)
    }

    /// Box a variant defined outside this crate.
    pub fn custom<V: CustomVariant>(variant: V) -> Self {
        Self::Custom(Box::new(variant))
    }

    pub fn frame(&self) -> &Frame {
        match self {
            Self::GetEcuInfo(m) => m.frame(),
            Self::GetHash(m) => m.frame(),
            Self::SetState(m) => m.frame(),
            Self::SendAck(m) => m.frame(),
            Self::SendReport(m) => m.frame(),
            Self::Custom(m) => m.variant_frame(),
            Self::Generic(frame) => frame,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetEcuInfo(_) => GetEcuInfo::NAME,
            Self::GetHash(_) => GetHash::NAME,
            Self::SetState(_) => SetState::NAME,
            Self::SendAck(_) => SendAck::NAME,
            Self::SendReport(_) => SendReport::NAME,
            Self::Custom(m) => m.variant_name(),
            Self::Generic(_) => "Generic",
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.frame().kind()
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, Self::Generic(_))
    }

    /// Borrow a custom variant as its concrete type.
    pub fn downcast_ref<V: 'static>(&self) -> Option<&V> {
        match self {
            Self::Custom(m) => m.as_any().downcast_ref::<V>(),
            _ => None,
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        self.frame().to_bytes()
    }

    pub fn to_hex(&self) -> String {
        self.frame().to_hex()
    }

    pub fn into_frame(self) -> Frame {
        match self {
            Self::GetEcuInfo(m) => m.into_frame(),
            Self::GetHash(m) => m.into_frame(),
            Self::SetState(m) => m.into_frame(),
            Self::SendAck(m) => m.into_frame(),
            Self::SendReport(m) => m.into_frame(),
            Self::Custom(m) => m.variant_frame().clone(),
            Self::Generic(frame) => frame,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.frame();
        write!(
            f,
            "{}(type: {}, class: {}, command: {}, len: {})",
            self.name(),
            frame.message_type(),
            frame.message_class(),
            frame.command(),
            frame.length()
        )
    }
}

macro_rules! message_from {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Message {
                fn from(value: $variant) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

message_from!(GetEcuInfo, GetHash, SetState, SendAck, SendReport);

impl From<Frame> for Message {
    fn from(frame: Frame) -> Self {
        Self::Generic(frame)
    }
}
