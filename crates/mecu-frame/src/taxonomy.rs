//! Closed code sets carried in the frame header and reporting payloads.
//!
//! Every set maps a wire code to a symbolic variant and a display label.
//! Looking up a code outside the set yields [`UnresolvedCode`]; the caller
//! decides whether that is fatal.

use std::fmt;
use std::str::FromStr;

/// Which code set a lookup was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeFamily {
    MessageType,
    MessageClass,
    ReportingCommand,
    SystemCommand,
    ValueType,
}

impl fmt::Display for CodeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CodeFamily::MessageType => "message type",
            CodeFamily::MessageClass => "message class",
            CodeFamily::ReportingCommand => "reporting command",
            CodeFamily::SystemCommand => "system command",
            CodeFamily::ValueType => "reporting value type",
        })
    }
}

/// A wire code that matches no member of its set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {family} code 0x{code:02x}")]
pub struct UnresolvedCode {
    pub family: CodeFamily,
    pub code: u8,
}

/// A symbolic name that matches no member of its set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {family} name {name:?}")]
pub struct UnknownName {
    pub family: CodeFamily,
    pub name: String,
}

fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_uppercase().replace('-', "_")
}

/// Declares a `#[repr(u8)]` code set with symbolic names and labels.
macro_rules! code_set {
    (
        $(#[$meta:meta])*
        pub enum $name:ident in $family:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $code:literal => ($sym:literal, $label:literal),
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant = $code,
            )+
        }

        impl $name {
            /// Every member, in code order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire code.
            pub const fn code(self) -> u8 {
                self as u8
            }

            /// Resolve a wire code.
            pub const fn from_code(code: u8) -> Result<Self, UnresolvedCode> {
                match code {
                    $($code => Ok($name::$variant),)+
                    _ => Err(UnresolvedCode {
                        family: CodeFamily::$family,
                        code,
                    }),
                }
            }

            /// Human-readable label.
            pub const fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Symbolic (SCREAMING_SNAKE) name.
            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $sym,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = UnknownName;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalize_name(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|member| member.name() == wanted)
                    .ok_or_else(|| UnknownName {
                        family: CodeFamily::$family,
                        name: s.to_string(),
                    })
            }
        }

        impl TryFrom<u8> for $name {
            type Error = UnresolvedCode;

            fn try_from(code: u8) -> Result<Self, Self::Error> {
                Self::from_code(code)
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value.code()
            }
        }
    };
}

code_set! {
    /// Direction of a frame.
    pub enum MessageType in MessageType {
        Request = 0x00 => ("REQUEST", "Request"),
        Response = 0x0F => ("RESPONSE", "Response"),
    }
}

code_set! {
    /// Protocol subsystem a frame belongs to.
    pub enum MessageClass in MessageClass {
        Reporting = 0x00 => ("REPORTING", "Reporting"),
        Tables = 0x01 => ("TABLES", "Tables"),
        Drivers = 0x02 => ("DRIVERS", "Drivers"),
        Datalinks = 0x03 => ("DATALINKS", "Datalinks"),
        System = 0x04 => ("SYSTEM", "System"),
        FwUpdate = 0x05 => ("FWUPDATE", "Firmware Update"),
        Datalog = 0x06 => ("DATALOG", "Data Log"),
        Triglog = 0x07 => ("TRIGLOG", "Trigger Log"),
        Dbw = 0x08 => ("DBW", "DBW"),
    }
}

code_set! {
    /// Commands of the reporting class.
    pub enum ReportingCommand in ReportingCommand {
        SendReport = 0x00 => ("SEND_REPORT", "Send Report"),
        SendAck = 0x01 => ("SEND_ACK", "Send Ack"),
        SetState = 0x02 => ("SET_STATE", "Set State"),
        SetSpecialCfg = 0x03 => ("SET_SPECIAL_CFG", "Set Special Config."),
    }
}

code_set! {
    /// Commands of the system class.
    pub enum SystemCommand in SystemCommand {
        GetEcuInfo = 0x00 => ("GET_ECU_INFO", "Get ECU Info"),
        GetHash = 0x01 => ("GET_HASH", "Get Hash"),
        SetRtc = 0x02 => ("SET_RTC", "Set RTC"),
        FactoryReset = 0x03 => ("FACTORY_RESET", "Factory Reset"),
        PwlockSetState = 0x04 => ("PWLOCK_SET_STATE", "PWLock Set State"),
        PwlockGetState = 0x05 => ("PWLOCK_GET_STATE", "PWLock Get State"),
        RaceUnlock = 0x06 => ("RACE_UNLOCK", "Race Unlock"),
    }
}

/// The command taxonomy a class owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandSet {
    Reporting,
    System,
}

impl CommandSet {
    /// Resolve a command code within this set.
    pub const fn resolve(self, code: u8) -> Result<CommandCode, UnresolvedCode> {
        match self {
            CommandSet::Reporting => match ReportingCommand::from_code(code) {
                Ok(command) => Ok(CommandCode::Reporting(command)),
                Err(err) => Err(err),
            },
            CommandSet::System => match SystemCommand::from_code(code) {
                Ok(command) => Ok(CommandCode::System(command)),
                Err(err) => Err(err),
            },
        }
    }
}

impl MessageClass {
    /// Command taxonomy for this class, if the protocol defines one.
    pub const fn command_set(self) -> Option<CommandSet> {
        match self {
            MessageClass::Reporting => Some(CommandSet::Reporting),
            MessageClass::System => Some(CommandSet::System),
            _ => None,
        }
    }
}

/// A command byte interpreted under its class.
///
/// Codes the class has no name for are kept as [`CommandCode::Raw`] so they
/// survive a decode/encode round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    Reporting(ReportingCommand),
    System(SystemCommand),
    Raw(u8),
}

impl CommandCode {
    /// Interpret `code` under `class`. Never fails.
    pub const fn resolve(class: MessageClass, code: u8) -> Self {
        match class.command_set() {
            Some(set) => match set.resolve(code) {
                Ok(command) => command,
                Err(_) => CommandCode::Raw(code),
            },
            None => CommandCode::Raw(code),
        }
    }

    /// Wire code.
    pub const fn code(self) -> u8 {
        match self {
            CommandCode::Reporting(command) => command.code(),
            CommandCode::System(command) => command.code(),
            CommandCode::Raw(code) => code,
        }
    }

    /// True when the command has a name in its class taxonomy.
    pub const fn is_known(self) -> bool {
        !matches!(self, CommandCode::Raw(_))
    }

    /// Human-readable label; raw codes read as "Unknown".
    pub const fn label(self) -> &'static str {
        match self {
            CommandCode::Reporting(command) => command.label(),
            CommandCode::System(command) => command.label(),
            CommandCode::Raw(_) => "Unknown",
        }
    }

    /// Parse a command for `class` from a symbolic name or a numeric code
    /// (`0x02`, `2`).
    pub fn parse(class: MessageClass, input: &str) -> Result<Self, UnknownName> {
        if let Some(code) = parse_numeric(input) {
            return Ok(Self::resolve(class, code));
        }

        let family = match class.command_set() {
            Some(CommandSet::Reporting) => CodeFamily::ReportingCommand,
            Some(CommandSet::System) => CodeFamily::SystemCommand,
            None => {
                return Err(UnknownName {
                    family: CodeFamily::MessageClass,
                    name: format!("{input} (class {} has no named commands)", class.name()),
                })
            }
        };

        let resolved = match family {
            CodeFamily::ReportingCommand => input.parse().map(CommandCode::Reporting),
            _ => input.parse().map(CommandCode::System),
        };
        resolved.map_err(|_| UnknownName {
            family,
            name: input.to_string(),
        })
    }
}

fn parse_numeric(input: &str) -> Option<u8> {
    let input = input.trim();
    match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => input.parse().ok(),
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandCode::Raw(code) => write!(f, "Unknown (0x{code:02x})"),
            known => f.write_str(known.label()),
        }
    }
}

impl From<ReportingCommand> for CommandCode {
    fn from(command: ReportingCommand) -> Self {
        CommandCode::Reporting(command)
    }
}

impl From<SystemCommand> for CommandCode {
    fn from(command: SystemCommand) -> Self {
        CommandCode::System(command)
    }
}

/// The `(class, command)` pair a message variant is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageKind {
    class: MessageClass,
    command: CommandCode,
}

impl MessageKind {
    /// Build a kind; the command is re-resolved under `class` so that equal
    /// wire bytes always produce equal kinds.
    pub const fn new(class: MessageClass, command: CommandCode) -> Self {
        Self {
            class,
            command: CommandCode::resolve(class, command.code()),
        }
    }

    pub const fn class(self) -> MessageClass {
        self.class
    }

    pub const fn command(self) -> CommandCode {
        self.command
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.class, self.command)
    }
}

/// Fixed-width encoding record for a reporting value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueTypeSpec {
    pub code: u8,
    pub byte_width: usize,
    pub name: &'static str,
    pub label: &'static str,
}

/// Indexed by wire code.
static VALUE_TYPES: [ValueTypeSpec; 6] = [
    ValueTypeSpec {
        code: 0x00,
        byte_width: 4,
        name: "FLOAT32",
        label: "Float (4 Bytes)",
    },
    ValueTypeSpec {
        code: 0x01,
        byte_width: 2,
        name: "INT16",
        label: "Signed Integer (2 Bytes)",
    },
    ValueTypeSpec {
        code: 0x02,
        byte_width: 2,
        name: "UINT16",
        label: "Unsigned Integer (2 Bytes)",
    },
    ValueTypeSpec {
        code: 0x03,
        byte_width: 1,
        name: "INT8",
        label: "Signed Integer (1 Byte)",
    },
    ValueTypeSpec {
        code: 0x04,
        byte_width: 1,
        name: "UINT8",
        label: "Unsigned Integer (1 Byte)",
    },
    ValueTypeSpec {
        code: 0x05,
        byte_width: 1,
        name: "BOOL8",
        label: "Boolean (1 Byte)",
    },
];

/// Encoding of one telemetry channel inside a streaming report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReportingValueType {
    Float32 = 0x00,
    Int16 = 0x01,
    UInt16 = 0x02,
    Int8 = 0x03,
    UInt8 = 0x04,
    Bool8 = 0x05,
}

impl ReportingValueType {
    pub const ALL: &'static [ReportingValueType] = &[
        ReportingValueType::Float32,
        ReportingValueType::Int16,
        ReportingValueType::UInt16,
        ReportingValueType::Int8,
        ReportingValueType::UInt8,
        ReportingValueType::Bool8,
    ];

    pub const fn from_code(code: u8) -> Result<Self, UnresolvedCode> {
        match code {
            0x00 => Ok(ReportingValueType::Float32),
            0x01 => Ok(ReportingValueType::Int16),
            0x02 => Ok(ReportingValueType::UInt16),
            0x03 => Ok(ReportingValueType::Int8),
            0x04 => Ok(ReportingValueType::UInt8),
            0x05 => Ok(ReportingValueType::Bool8),
            _ => Err(UnresolvedCode {
                family: CodeFamily::ValueType,
                code,
            }),
        }
    }

    /// The `{code, byte_width, label}` record for this type.
    pub fn spec(self) -> &'static ValueTypeSpec {
        &VALUE_TYPES[self as usize]
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Bytes occupied on the wire.
    pub fn byte_width(self) -> usize {
        self.spec().byte_width
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

impl fmt::Display for ReportingValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReportingValueType {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.name() == wanted)
            .ok_or_else(|| UnknownName {
                family: CodeFamily::ValueType,
                name: s.to_string(),
            })
    }
}

impl TryFrom<u8> for ReportingValueType {
    type Error = UnresolvedCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}
