use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use mecu_transport::SerialStream;

use crate::codec::{decode_frame, Frame, FrameConfig, CHECKSUM_SIZE, HEADER_SIZE, MAGIC};
use crate::error::{FrameError, Result};

/// Reads complete frames from any `Read` stream.
///
/// Framing is two-phase: exactly `HEADER_SIZE` bytes first, then the
/// declared payload length plus the checksum. Partial reads are handled
/// internally, so callers always get complete frames.
///
/// A read timeout surfaces as `FrameError::Io` but keeps the bytes already
/// received; the next `read_frame` call resumes the pending frame.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    /// Bytes of the pending frame already in `buf`.
    filled: usize,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(HEADER_SIZE + CHECKSUM_SIZE),
            filled: 0,
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        if self.filled == 0 {
            self.buf.clear();
            self.buf.resize(HEADER_SIZE, 0);
        }
        self.fill()?;

        // Header stage; after a resumed timeout the buffer may already be sized for the body.
        if self.buf.len() == HEADER_SIZE {
            if self.buf[..2] != MAGIC {
                self.filled = 0;
                return Err(FrameError::MalformedFrame {
                    found: [self.buf[0], self.buf[1]],
                });
            }

            let length = usize::from(u16::from_le_bytes([self.buf[2], self.buf[3]]));
            if length > self.config.max_payload_size {
                self.filled = 0;
                return Err(FrameError::PayloadTooLarge {
                    size: length,
                    max: self.config.max_payload_size,
                });
            }

            self.buf.resize(HEADER_SIZE + length + CHECKSUM_SIZE, 0);
            self.fill()?;
        }

        let total = self.buf.len();
        self.filled = 0;
        let frame = decode_frame(&mut self.buf, &self.config)?.ok_or(
            FrameError::TruncatedPayload {
                needed: total,
                available: self.buf.len(),
            },
        )?;
        tracing::trace!(frame = %frame, "frame received");
        Ok(frame)
    }

    /// Read until `self.buf` is full, continuing from `self.filled`.
    fn fill(&mut self) -> Result<()> {
        let end = self.buf.len();
        while self.filled < end {
            match self.inner.read(&mut self.buf[self.filled..end]) {
                Ok(0) => {
                    self.filled = 0;
                    return Err(FrameError::ConnectionClosed);
                }
                Ok(n) => self.filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                // Without a configured timeout, driver timeouts just mean "no data yet".
                Err(err)
                    if err.kind() == ErrorKind::TimedOut && self.config.read_timeout.is_none() =>
                {
                    continue
                }
                Err(err) => {
                    if err.kind() == ErrorKind::TimedOut && self.filled > 0 {
                        tracing::debug!(
                            received = self.filled,
                            expected = end,
                            "read timed out mid-frame, keeping partial frame"
                        );
                    }
                    return Err(FrameError::Io(err));
                }
            }
        }
        Ok(())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<SerialStream> {
    /// Create a frame reader for a serial port and apply the read timeout from config.
    pub fn with_config_serial(mut inner: SerialStream, config: FrameConfig) -> Result<Self> {
        if let Some(timeout) = config.read_timeout {
            inner.set_timeout(timeout).map_err(transport_to_frame_error)?;
        }
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: mecu_transport::TransportError) -> FrameError {
    match err {
        mecu_transport::TransportError::Io(io) => FrameError::Io(io),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::codec::ChecksumPolicy;
    use crate::taxonomy::{MessageClass, MessageType, ReportingCommand, SystemCommand};

    fn get_ecu_info() -> Frame {
        Frame::new(
            MessageType::Request,
            MessageClass::System,
            SystemCommand::GetEcuInfo,
            Vec::new(),
        )
        .unwrap()
    }

    fn report(payload: &[u8]) -> Frame {
        Frame::new(
            MessageType::Response,
            MessageClass::Reporting,
            ReportingCommand::SendReport,
            payload.to_vec(),
        )
        .unwrap()
    }

    fn wire(frames: &[Frame]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for frame in frames {
            frame.encode(&mut buf);
        }
        buf.to_vec()
    }

    #[test]
    fn read_single_frame() {
        let mut reader = FrameReader::new(Cursor::new(wire(&[get_ecu_info()])));
        assert_eq!(reader.read_frame().unwrap(), get_ecu_info());
    }

    #[test]
    fn read_multiple_frames() {
        let frames = [get_ecu_info(), report(&[0x07, 0x10, 0x27]), report(&[0x08])];
        let mut reader = FrameReader::new(Cursor::new(wire(&frames)));

        for expected in &frames {
            assert_eq!(&reader.read_frame().unwrap(), expected);
        }
        assert!(matches!(
            reader.read_frame().unwrap_err(),
            FrameError::ConnectionClosed
        ));
    }

    #[test]
    fn read_frame_with_large_payload() {
        let payload = vec![0xAB; 4096];
        let frame = report(&payload);
        let mut reader = FrameReader::new(Cursor::new(wire(&[frame.clone()])));
        assert_eq!(reader.read_frame().unwrap(), frame);
    }

    #[test]
    fn partial_read_handling() {
        let frame = report(&[0x01, 0x02, 0x03]);
        let byte_reader = ByteByByteReader {
            bytes: wire(&[frame.clone()]),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);
        assert_eq!(reader.read_frame().unwrap(), frame);
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let mut partial = BytesMut::new();
        partial.put_slice(&MAGIC);
        partial.put_u16_le(16);
        partial.put_slice(&[0x0F, 0x00, 0x00]);
        partial.put_slice(b"only-part");

        let mut reader = FrameReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn invalid_magic_in_stream() {
        let bytes = vec![0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let mut reader = FrameReader::new(Cursor::new(bytes));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::MalformedFrame {
                found: [0x00, 0x01]
            }
        ));
    }

    #[test]
    fn oversized_frame_in_stream() {
        let cfg = FrameConfig {
            max_payload_size: 16,
            ..FrameConfig::default()
        };
        let mut reader =
            FrameReader::with_config(Cursor::new(wire(&[report(&[0u8; 32])])), cfg);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 32, max: 16 }));
    }

    #[test]
    fn corrupted_checksum_follows_policy() {
        let mut bytes = wire(&[get_ecu_info()]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;

        let mut strict = FrameReader::new(Cursor::new(bytes.clone()));
        assert!(matches!(
            strict.read_frame().unwrap_err(),
            FrameError::ChecksumMismatch { .. }
        ));

        let lenient_cfg = FrameConfig {
            checksum_policy: ChecksumPolicy::Warn,
            ..FrameConfig::default()
        };
        let mut lenient = FrameReader::with_config(Cursor::new(bytes), lenient_cfg);
        assert_eq!(lenient.read_frame().unwrap(), get_ecu_info());
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            if buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    /// Fails once with `first_error`, then serves `bytes`.
    struct ErrorThenData {
        first_error: Option<ErrorKind>,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl ErrorThenData {
        fn new(kind: ErrorKind, bytes: Vec<u8>) -> Self {
            Self {
                first_error: Some(kind),
                bytes,
                pos: 0,
            }
        }
    }

    impl Read for ErrorThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if let Some(kind) = self.first_error.take() {
                return Err(std::io::Error::from(kind));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn interrupted_read_retries() {
        let source = ErrorThenData::new(ErrorKind::Interrupted, wire(&[get_ecu_info()]));
        let mut framed = FrameReader::new(source);
        assert_eq!(framed.read_frame().unwrap(), get_ecu_info());
    }

    #[test]
    fn driver_timeout_retried_without_read_timeout() {
        let source = ErrorThenData::new(ErrorKind::TimedOut, wire(&[get_ecu_info()]));
        let mut framed = FrameReader::new(source);
        assert_eq!(framed.read_frame().unwrap(), get_ecu_info());
    }

    #[test]
    fn driver_timeout_propagates_with_read_timeout() {
        let cfg = FrameConfig {
            read_timeout: Some(Duration::from_millis(50)),
            ..FrameConfig::default()
        };
        let source = ErrorThenData::new(ErrorKind::TimedOut, wire(&[get_ecu_info()]));
        let mut framed = FrameReader::with_config(source, cfg);
        let err = framed.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::TimedOut));
    }

    /// Serves `bytes`, failing once with `TimedOut` when `pos` reaches `stall_at`.
    struct StallingReader {
        bytes: Vec<u8>,
        pos: usize,
        stall_at: Option<usize>,
    }

    impl Read for StallingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.stall_at == Some(self.pos) {
                self.stall_at = None;
                return Err(std::io::Error::from(ErrorKind::TimedOut));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let limit = match self.stall_at {
                Some(at) if at > self.pos => at,
                _ => self.bytes.len(),
            };
            let n = (limit - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn timeout_mid_frame_resumes_on_next_read() {
        let info = Frame::new(
            MessageType::Response,
            MessageClass::System,
            SystemCommand::GetEcuInfo,
            vec![0x01, 0x02, 0x03, 0x04],
        )
        .unwrap();
        let cfg = FrameConfig {
            read_timeout: Some(Duration::from_millis(10)),
            ..FrameConfig::default()
        };
        let source = StallingReader {
            bytes: wire(&[info.clone(), info.clone()]),
            pos: 0,
            stall_at: Some(9),
        };
        let mut framed = FrameReader::with_config(source, cfg);

        let err = framed.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::TimedOut));
        assert_eq!(framed.read_frame().unwrap(), info);
        assert_eq!(framed.read_frame().unwrap(), info);
        assert!(matches!(
            framed.read_frame().unwrap_err(),
            FrameError::ConnectionClosed
        ));
    }

    #[test]
    fn timeout_inside_header_resumes_on_next_read() {
        let cfg = FrameConfig {
            read_timeout: Some(Duration::from_millis(10)),
            ..FrameConfig::default()
        };
        let source = StallingReader {
            bytes: wire(&[get_ecu_info()]),
            pos: 0,
            stall_at: Some(3),
        };
        let mut framed = FrameReader::with_config(source, cfg);

        assert!(framed.read_frame().is_err());
        assert_eq!(framed.read_frame().unwrap(), get_ecu_info());
    }

    #[test]
    fn malformed_header_resets_pending_frame() {
        let mut bytes = vec![0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00];
        bytes.extend(wire(&[get_ecu_info()]));
        let mut framed = FrameReader::new(Cursor::new(bytes));

        assert!(matches!(
            framed.read_frame().unwrap_err(),
            FrameError::MalformedFrame { .. }
        ));
        assert_eq!(framed.read_frame().unwrap(), get_ecu_info());
    }

    #[test]
    fn read_would_block_propagates_io_error() {
        let source = ErrorThenData::new(ErrorKind::WouldBlock, wire(&[get_ecu_info()]));
        let mut framed = FrameReader::new(source);
        let err = framed.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_socket_pair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        let frames = [get_ecu_info(), report(&[0x01, 0xE8, 0x03])];
        for frame in &frames {
            writer.write_frame(frame).unwrap();
        }
        for expected in &frames {
            assert_eq!(&reader.read_frame().unwrap(), expected);
        }
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = FrameReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        assert!(reader.config().read_timeout.is_none());
        let _inner = reader.into_inner();
    }
}
