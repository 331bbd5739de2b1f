use std::io::{Read, Write};
use std::time::Duration;

use mecu_frame::{Frame, FrameConfig, FrameReader, FrameWriter, MessageType};
use mecu_message::{
    GetEcuInfo, GetHash, HashMode, Message, MessageRegistry, MessageVariant,
    ReportingEntityDescriptor, ReportingEntityValue, SendAck, SendReport, SetState,
};
use mecu_transport::{SerialConfig, SerialStream};

use crate::error::{Result, SessionError};

const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(1);

/// Session behavior settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Framing limits and stream timeouts.
    pub frame: FrameConfig,
    /// Send a `SendAck` for every report returned by [`Session::next_report`].
    pub auto_ack: bool,
    /// Unrelated frames tolerated while waiting for a reply or report.
    pub max_skipped: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig {
                read_timeout: Some(DEFAULT_IO_TIMEOUT),
                write_timeout: Some(DEFAULT_IO_TIMEOUT),
                ..FrameConfig::default()
            },
            auto_ack: true,
            max_skipped: 32,
        }
    }
}

/// One decoded report row.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub sequence: Option<u8>,
    pub values: Vec<ReportingEntityValue>,
}

/// A blocking conversation with one ECU.
pub struct Session<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    registry: MessageRegistry,
    config: SessionConfig,
    entities: Option<Vec<ReportingEntityDescriptor>>,
}

impl Session<SerialStream, SerialStream> {
    /// Open a serial device and start a session on it.
    pub fn open_serial(serial: &SerialConfig, config: SessionConfig) -> Result<Self> {
        let stream = SerialStream::open(serial)?;
        let reader_stream = stream.try_clone()?;

        let reader = FrameReader::with_config_serial(reader_stream, config.frame.clone())?;
        let writer = FrameWriter::with_config_serial(stream, config.frame.clone())?;
        tracing::info!(path = %serial.path, baud = serial.baud_rate, "session opened");

        Ok(Self::from_frame_io(reader, writer, config))
    }
}

impl<R: Read, W: Write> Session<R, W> {
    /// Build a session over an arbitrary byte stream pair.
    pub fn from_parts(reader: R, writer: W, config: SessionConfig) -> Self {
        let reader = FrameReader::with_config(reader, config.frame.clone());
        let writer = FrameWriter::with_config(writer, config.frame.clone());
        Self::from_frame_io(reader, writer, config)
    }

    /// Build a session over an existing frame reader and writer.
    pub fn from_frame_io(
        reader: FrameReader<R>,
        writer: FrameWriter<W>,
        config: SessionConfig,
    ) -> Self {
        Self {
            reader,
            writer,
            registry: MessageRegistry::builtin().with_frame_config(config.frame.clone()),
            config,
            entities: None,
        }
    }

    /// Dispatch incoming frames through `registry` instead of the built-in one.
    pub fn with_registry(mut self, registry: MessageRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Write one message.
    pub fn send(&mut self, message: &Message) -> Result<()> {
        self.send_frame(message.frame())?;
        tracing::debug!(message = %message, "sent");
        Ok(())
    }

    pub fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        self.writer.write_frame(frame)?;
        Ok(())
    }

    /// Read one frame and dispatch it.
    pub fn recv(&mut self) -> Result<Message> {
        let frame = self.reader.read_frame()?;
        let message = self.registry.dispatch_frame(frame)?;
        tracing::debug!(message = %message, "received");
        Ok(message)
    }

    /// Send `message` and wait for the RESPONSE of the same kind.
    ///
    /// Other frames arriving in between are dropped, up to
    /// `max_skipped` of them.
    pub fn request(&mut self, message: impl Into<Message>) -> Result<Message> {
        let message = message.into();
        let expected = message.kind();
        self.send(&message)?;

        for _ in 0..=self.config.max_skipped {
            let reply = self.recv()?;
            if reply.kind() == expected && reply.frame().message_type() == MessageType::Response {
                return Ok(reply);
            }
            tracing::debug!(expected = %expected, found = %reply, "skipping unrelated frame");
        }
        Err(SessionError::NoReply {
            expected,
            skipped: self.config.max_skipped + 1,
        })
    }

    /// Like [`Session::request`], reinterpreting the reply as `V`.
    pub fn request_variant<V: MessageVariant>(&mut self, message: V) -> Result<V> {
        let reply = self.request(message)?;
        Ok(V::from_frame(reply.into_frame())?)
    }

    /// Query the ECU identification block.
    pub fn ecu_info(&mut self) -> Result<GetEcuInfo> {
        self.request_variant(GetEcuInfo::request())
    }

    /// Query the firmware hash.
    pub fn hash(&mut self, mode: HashMode) -> Result<GetHash> {
        self.request_variant(GetHash::with_mode(mode))
    }

    /// Turn streaming on and keep the entity table from the reply.
    pub fn enable_reporting(&mut self) -> Result<&[ReportingEntityDescriptor]> {
        let reply = self.request_variant(SetState::enable(true))?;
        tracing::info!(
            version = ?reply.version(),
            entities = reply.entities().len(),
            "reporting enabled"
        );
        let entities = self.entities.insert(reply.into_table().entities);
        Ok(entities.as_slice())
    }

    /// Turn streaming off and forget the entity table.
    pub fn disable_reporting(&mut self) -> Result<()> {
        self.request_variant(SetState::enable(false))?;
        self.entities = None;
        tracing::info!("reporting disabled");
        Ok(())
    }

    /// Wait for the next report and decode it against the entity table.
    ///
    /// With `auto_ack` the report is acknowledged before its values are
    /// decoded, so a malformed row doesn't stall the stream.
    pub fn next_report(&mut self) -> Result<Report> {
        if self.entities.is_none() {
            return Err(SessionError::ReportingDisabled);
        }

        for _ in 0..=self.config.max_skipped {
            let report = match self.recv()? {
                Message::SendReport(report) => report,
                other => {
                    tracing::debug!(found = %other, "skipping non-report frame");
                    continue;
                }
            };
            if self.config.auto_ack {
                self.acknowledge()?;
            }
            let values = report.parse_report(self.entities())?;
            return Ok(Report {
                sequence: report.sequence(),
                values,
            });
        }
        Err(SessionError::NoReply {
            expected: SendReport::KIND,
            skipped: self.config.max_skipped + 1,
        })
    }

    /// Acknowledge the last report.
    pub fn acknowledge(&mut self) -> Result<()> {
        self.send(&SendAck::request().into())
    }

    /// Entity table from the last `enable_reporting`; empty when disabled.
    pub fn entities(&self) -> &[ReportingEntityDescriptor] {
        self.entities.as_deref().unwrap_or_default()
    }

    pub fn is_reporting(&self) -> bool {
        self.entities.is_some()
    }

    /// Seed the entity table without a `SetState` exchange, e.g. when
    /// attaching to an ECU that is already streaming.
    pub fn set_entities(&mut self, entities: Vec<ReportingEntityDescriptor>) {
        self.entities = Some(entities);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn registry(&self) -> &MessageRegistry {
        &self.registry
    }

    pub fn into_parts(self) -> (FrameReader<R>, FrameWriter<W>) {
        (self.reader, self.writer)
    }
}
