use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use mecu_frame::{ChecksumPolicy, FrameConfig};
use mecu_session::{Session, SessionConfig};
use mecu_transport::{SerialConfig, SerialStream, DEFAULT_BAUD_RATE};

use crate::exit::{session_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod hash;
pub mod info;
pub mod ports;
pub mod stream;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode hex-encoded frames.
    Decode(DecodeArgs),
    /// Build a frame and print it as hex.
    Encode(EncodeArgs),
    /// Query the ECU identification block.
    Info(InfoArgs),
    /// Query the ECU firmware hash.
    Hash(HashArgs),
    /// Enable reporting and print live values.
    Stream(StreamArgs),
    /// List serial ports.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Hash(args) => hash::run(args, format),
        Command::Stream(args) => stream::run(args, format),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Serial connection options shared by the ECU commands.
#[derive(Args, Debug)]
pub struct PortArgs {
    /// Serial device, e.g. /dev/ttyUSB0 or COM3.
    #[arg(long, short = 'p', env = "MECU_PORT")]
    pub port: String,
    /// Line speed in bits per second.
    #[arg(long, short = 'b', env = "MECU_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Reply timeout (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub timeout: String,
}

impl PortArgs {
    pub fn open_session(
        &self,
        auto_ack: bool,
    ) -> CliResult<Session<SerialStream, SerialStream>> {
        let timeout = parse_duration(&self.timeout)?;
        let serial = SerialConfig {
            timeout,
            ..SerialConfig::new(&self.port).with_baud_rate(self.baud)
        };
        let config = SessionConfig {
            frame: FrameConfig {
                read_timeout: Some(timeout),
                write_timeout: Some(timeout),
                ..FrameConfig::default()
            },
            auto_ack,
            ..SessionConfig::default()
        };
        Session::open_serial(&serial, config)
            .map_err(|err| session_error(&format!("failed opening {}", self.port), err))
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex-encoded bytes holding one or more frames. Whitespace is ignored.
    #[arg(required = true)]
    pub hex: Vec<String>,
    /// Entity table used to decode reports, e.g. 1:uint16,14:int8.
    #[arg(long, value_delimiter = ',')]
    pub entities: Vec<String>,
    /// Accept frames whose checksum doesn't match, logging a warning.
    #[arg(long)]
    pub lenient: bool,
}

impl DecodeArgs {
    pub fn checksum_policy(&self) -> ChecksumPolicy {
        if self.lenient {
            ChecksumPolicy::Warn
        } else {
            ChecksumPolicy::Reject
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum Direction {
    Request,
    Response,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Message class, by name (system) or code (4).
    pub class: String,
    /// Command, by name (get_hash) or code (0x01).
    pub command: String,
    /// Hex payload.
    #[arg(long, default_value = "")]
    pub payload: String,
    /// Frame direction.
    #[arg(long = "type", value_enum, default_value = "request")]
    pub direction: Direction,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub port: PortArgs,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum HashModeArg {
    Overall,
    Detailed,
}

#[derive(Args, Debug)]
pub struct HashArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Hash granularity.
    #[arg(long, value_enum, default_value = "detailed")]
    pub mode: HashModeArg,
}

#[derive(Args, Debug)]
pub struct StreamArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Exit after N reports.
    #[arg(long)]
    pub count: Option<usize>,
    /// Only print these entity ids (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub ids: Option<Vec<u16>>,
    /// Don't acknowledge reports.
    #[arg(long)]
    pub no_ack: bool,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show build details.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
    }

    #[test]
    fn parse_duration_rejects_bad_input() {
        for input in ["", "0", "abc", "5m"] {
            let err = parse_duration(input).unwrap_err();
            assert_eq!(err.code, USAGE, "{input}");
        }
    }
}
