//! Serial byte-stream adapter for the ME ECU protocol.
//!
//! This is the lowest layer of mecu. It only opens a serial device and
//! hands back a blocking [`SerialStream`] implementing `Read + Write`;
//! framing lives in `mecu-frame`.

pub mod error;
pub mod serial;

pub use error::{Result, TransportError};
pub use serial::{available_ports, PortInfo, SerialConfig, SerialStream, DEFAULT_BAUD_RATE};
