use std::collections::HashMap;
use std::sync::OnceLock;

use mecu_frame::{Frame, FrameConfig, MessageKind};

use crate::error::{MessageError, Result};
use crate::message::Message;
use crate::reporting::{SendAck, SendReport, SetState};
use crate::system::{GetEcuInfo, GetHash};
use crate::variant::MessageVariant;

/// Type-erased constructors for one registered variant.
#[derive(Debug, Clone, Copy)]
pub struct VariantEntry {
    kind: MessageKind,
    name: &'static str,
    request: fn() -> Message,
    from_frame: fn(Frame) -> Result<Message>,
}

fn build_request<V: MessageVariant>() -> Message {
    V::request().into()
}

fn build_from_frame<V: MessageVariant>(frame: Frame) -> Result<Message> {
    V::from_frame(frame).map(Into::into)
}

impl VariantEntry {
    pub fn of<V: MessageVariant>() -> Self {
        Self {
            kind: V::KIND,
            name: V::NAME,
            request: build_request::<V>,
            from_frame: build_from_frame::<V>,
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// A fresh REQUEST of this variant.
    pub fn request(&self) -> Message {
        (self.request)()
    }

    /// Build the variant from a decoded frame.
    pub fn build(&self, frame: Frame) -> Result<Message> {
        (self.from_frame)(frame)
    }
}

fn builtin_entries() -> [VariantEntry; 5] {
    [
        VariantEntry::of::<GetEcuInfo>(),
        VariantEntry::of::<GetHash>(),
        VariantEntry::of::<SetState>(),
        VariantEntry::of::<SendAck>(),
        VariantEntry::of::<SendReport>(),
    ]
}

/// Maps `(class, command)` pairs to variant constructors.
#[derive(Debug, Clone)]
pub struct MessageRegistry {
    entries: HashMap<MessageKind, VariantEntry>,
    frame_config: FrameConfig,
}

impl MessageRegistry {
    /// An empty registry. Every frame dispatches to [`Message::Generic`].
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            frame_config: FrameConfig::default(),
        }
    }

    /// A registry holding the variants defined in this crate.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for entry in builtin_entries() {
            registry.entries.insert(entry.kind, entry);
        }
        registry
    }

    /// Use `config` when dispatching raw bytes.
    pub fn with_frame_config(mut self, config: FrameConfig) -> Self {
        self.frame_config = config;
        self
    }

    pub fn frame_config(&self) -> &FrameConfig {
        &self.frame_config
    }

    /// Register a variant. Fails if its kind is already taken.
    pub fn register<V: MessageVariant>(&mut self) -> Result<()> {
        self.register_entry(VariantEntry::of::<V>())
    }

    pub fn register_entry(&mut self, entry: VariantEntry) -> Result<()> {
        if let Some(existing) = self.entries.get(&entry.kind) {
            return Err(MessageError::DuplicateKind {
                kind: entry.kind,
                existing: existing.name,
            });
        }
        tracing::debug!(kind = %entry.kind, name = entry.name, "variant registered");
        self.entries.insert(entry.kind, entry);
        Ok(())
    }

    pub fn lookup(&self, kind: MessageKind) -> Option<&VariantEntry> {
        self.entries.get(&kind)
    }

    pub fn contains(&self, kind: MessageKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Registered entries ordered by class code, then command code.
    pub fn entries(&self) -> Vec<&VariantEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by_key(|e| (e.kind.class().code(), e.kind.command().code()));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A fresh REQUEST for `kind`, if a variant is registered for it.
    pub fn request(&self, kind: MessageKind) -> Option<Message> {
        self.lookup(kind).map(VariantEntry::request)
    }

    /// Decode one frame from `src` and build its variant.
    pub fn dispatch(&self, src: &[u8]) -> Result<Message> {
        let frame = Frame::decode_with_config(src, &self.frame_config)?;
        self.dispatch_frame(frame)
    }

    /// Build the variant for an already-decoded frame.
    pub fn dispatch_frame(&self, frame: Frame) -> Result<Message> {
        match self.entries.get(&frame.kind()) {
            Some(entry) => entry.build(frame),
            None => {
                tracing::debug!(kind = %frame.kind(), "no variant registered, keeping generic frame");
                Ok(Message::Generic(frame))
            }
        }
    }
}

impl Default for MessageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide registry of the built-in variants.
pub fn default_registry() -> &'static MessageRegistry {
    static REGISTRY: OnceLock<MessageRegistry> = OnceLock::new();
    REGISTRY.get_or_init(MessageRegistry::builtin)
}

/// Decode and dispatch through [`default_registry`].
pub fn dispatch(src: &[u8]) -> Result<Message> {
    default_registry().dispatch(src)
}
