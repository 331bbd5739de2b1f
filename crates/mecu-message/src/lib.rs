//! Typed messages on top of `mecu-frame`.
//!
//! A frame's `(class, command)` pair selects a concrete variant through a
//! [`MessageRegistry`]. Variants own their payload interpretation; frames
//! with no registered variant are handed back as [`Message::Generic`] so
//! unknown traffic stays inspectable.
//!
//! The reporting subsystem needs caller-held state: the entity table from a
//! `SetState` response types every later `SendReport`.

pub mod entity;
pub mod error;
pub mod message;
pub mod registry;
pub mod reporting;
pub mod system;
pub mod variant;

pub use entity::{ReportingEntityDescriptor, ReportingEntityValue, ReportingValue};
pub use error::{MessageError, Result};
pub use message::{CustomVariant, Message};
pub use registry::{default_registry, dispatch, MessageRegistry, VariantEntry};
pub use reporting::{EntityTable, ReportingVersion, SendAck, SendReport, SetState};
pub use system::{GetEcuInfo, GetHash, HashMode};
pub use variant::MessageVariant;
