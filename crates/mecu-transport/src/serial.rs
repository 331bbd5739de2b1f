use std::io::{Read, Write};
use std::time::Duration;

use serialport::{SerialPort, SerialPortType};

use crate::error::{Result, TransportError};

/// Baud rate the ECU ships with.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Settings used to open a serial device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub path: String,
    /// Line speed in bits per second.
    pub baud_rate: u32,
    /// Per-read timeout applied by the driver.
    pub timeout: Duration,
}

impl SerialConfig {
    /// Config for `path` with the default baud rate and timeout.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Override the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: "/dev/ttyUSB0".to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: Duration::from_millis(100),
        }
    }
}

/// An open serial port implementing `Read + Write`.
///
/// Reads block for at most the configured timeout; callers that need
/// "exactly N bytes" semantics sit on top (see `mecu_frame::FrameReader`).
pub struct SerialStream {
    inner: Box<dyn SerialPort>,
    path: String,
}

impl SerialStream {
    /// Open the device described by `config`.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        if config.baud_rate == 0 {
            return Err(TransportError::InvalidBaudRate(config.baud_rate));
        }

        let inner = serialport::new(config.path.as_str(), config.baud_rate)
            .timeout(config.timeout)
            .open()
            .map_err(|source| TransportError::Open {
                path: config.path.clone(),
                source,
            })?;

        tracing::debug!(
            path = %config.path,
            baud_rate = config.baud_rate,
            "serial port opened"
        );

        Ok(Self {
            inner,
            path: config.path.clone(),
        })
    }

    /// Device path this stream was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Set the driver read/write timeout.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.inner.set_timeout(timeout).map_err(Into::into)
    }

    /// Current driver timeout.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout()
    }

    /// Number of bytes waiting in the receive buffer.
    pub fn bytes_to_read(&self) -> Result<u32> {
        self.inner.bytes_to_read().map_err(Into::into)
    }

    /// Try to clone this stream (shares the same device handle).
    pub fn try_clone(&self) -> Result<Self> {
        let inner = self.inner.try_clone()?;
        Ok(Self {
            inner,
            path: self.path.clone(),
        })
    }
}

impl Read for SerialStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for SerialStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("path", &self.path)
            .finish()
    }
}

/// A serial device visible on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub kind: &'static str,
    /// USB vendor/product id, when the port is a USB adapter.
    pub usb_id: Option<(u16, u16)>,
}

/// Enumerate serial devices.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|port| {
            let (kind, usb_id) = match &port.port_type {
                SerialPortType::UsbPort(usb) => ("usb", Some((usb.vid, usb.pid))),
                SerialPortType::PciPort => ("pci", None),
                SerialPortType::BluetoothPort => ("bluetooth", None),
                _ => ("unknown", None),
            };
            PortInfo {
                name: port.port_name,
                kind,
                usb_id,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_ecu_baud_rate() {
        let cfg = SerialConfig::default();
        assert_eq!(cfg.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(cfg.timeout, Duration::from_millis(100));
    }

    #[test]
    fn builder_overrides_path_and_baud() {
        let cfg = SerialConfig::new("/dev/ttyACM3").with_baud_rate(57_600);
        assert_eq!(cfg.path, "/dev/ttyACM3");
        assert_eq!(cfg.baud_rate, 57_600);
    }

    #[test]
    fn zero_baud_rate_rejected_before_open() {
        let cfg = SerialConfig::new("/dev/null").with_baud_rate(0);
        let err = SerialStream::open(&cfg).unwrap_err();
        assert!(matches!(err, TransportError::InvalidBaudRate(0)));
    }

    #[test]
    #[cfg(unix)]
    fn open_missing_device_reports_path() {
        let path = format!("/tmp/mecu-missing-tty-{}", std::process::id());
        let err = SerialStream::open(&SerialConfig::new(path.clone())).unwrap_err();
        match err {
            TransportError::Open { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}
