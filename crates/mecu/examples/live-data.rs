//! Connect to an ECU, print its identity, then stream live values.
//!
//! Run with:
//!   cargo run --example live-data -- /dev/ttyUSB0 115200

use mecu::message::{HashMode, Message, ReportingValue};
use mecu::session::{Session, SessionConfig};
use mecu::transport::{SerialConfig, DEFAULT_BAUD_RATE};

const RPM: u16 = 1;
const COOLANT_TEMP: u16 = 14;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let baud = match args.next() {
        Some(baud) => baud.parse()?,
        None => DEFAULT_BAUD_RATE,
    };

    let serial = SerialConfig::new(path).with_baud_rate(baud);
    let mut session = Session::open_serial(&serial, SessionConfig::default())?;
    eprintln!("Connected to {}", serial.path);

    let info = session.ecu_info()?;
    println!("{}", Message::from(info));
    let hash = session.hash(HashMode::Detailed)?;
    println!("{}", Message::from(hash));

    let entities = session.enable_reporting()?;
    println!("Received info on {} entities", entities.len());

    loop {
        let report = match session.next_report() {
            Ok(report) => report,
            Err(err) if err.is_timeout() => continue,
            Err(err) => return Err(err.into()),
        };
        for entity in &report.values {
            match (entity.id(), entity.value) {
                (RPM, value) => println!("RPM:           {value}"),
                (COOLANT_TEMP, ReportingValue::Float32(value)) => {
                    println!("Coolant Temp.: {value:.1}")
                }
                (COOLANT_TEMP, value) => println!("Coolant Temp.: {value}"),
                _ => {}
            }
        }
    }
}
