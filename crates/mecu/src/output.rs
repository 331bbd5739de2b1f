use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mecu_message::{Message, ReportingEntityDescriptor, ReportingEntityValue, ReportingValue};
use mecu_session::Report;
use mecu_transport::PortInfo;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
pub struct EntityOutput {
    id: u16,
    value_type: &'static str,
    width: usize,
}

impl From<&ReportingEntityDescriptor> for EntityOutput {
    fn from(descriptor: &ReportingEntityDescriptor) -> Self {
        Self {
            id: descriptor.id,
            value_type: descriptor.value_type.name(),
            width: descriptor.byte_width(),
        }
    }
}

#[derive(Serialize)]
pub struct ValueOutput {
    id: u16,
    value_type: &'static str,
    value: Value,
}

impl From<&ReportingEntityValue> for ValueOutput {
    fn from(entity: &ReportingEntityValue) -> Self {
        let value = match entity.value {
            ReportingValue::Float32(v) => Value::from(f64::from(v)),
            ReportingValue::Int16(v) => Value::from(v),
            ReportingValue::UInt16(v) => Value::from(v),
            ReportingValue::Int8(v) => Value::from(v),
            ReportingValue::UInt8(v) => Value::from(v),
            ReportingValue::Bool(v) => Value::from(v),
        };
        Self {
            id: entity.id(),
            value_type: entity.descriptor.value_type.name(),
            value,
        }
    }
}

#[derive(Serialize)]
pub struct MessageOutput {
    variant: &'static str,
    message_type: &'static str,
    message_class: &'static str,
    command: String,
    command_code: u8,
    length: u16,
    checksum: String,
    payload: String,
    wire: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    entities: Option<Vec<EntityOutput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<Vec<ValueOutput>>,
}

impl MessageOutput {
    pub fn new(message: &Message) -> Self {
        let frame = message.frame();
        let entities = match message {
            Message::SetState(state) if state.version().is_some() => {
                Some(state.entities().iter().map(EntityOutput::from).collect())
            }
            _ => None,
        };
        Self {
            variant: message.name(),
            message_type: frame.message_type().name(),
            message_class: frame.message_class().name(),
            command: frame.command().to_string(),
            command_code: frame.command().code(),
            length: frame.length(),
            checksum: format!("0x{:04x}", frame.checksum()),
            payload: hex::encode(frame.payload()),
            wire: frame.to_hex(),
            entities,
            values: None,
        }
    }

    pub fn with_values(mut self, values: &[ReportingEntityValue]) -> Self {
        self.values = Some(values.iter().map(ValueOutput::from).collect());
        self
    }
}

pub fn print_message(out: &MessageOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["variant", out.variant])
                .add_row(vec!["type", out.message_type])
                .add_row(vec!["class", out.message_class])
                .add_row(vec![
                    "command".to_string(),
                    format!("{} (0x{:02x})", out.command, out.command_code),
                ])
                .add_row(vec!["length".to_string(), out.length.to_string()])
                .add_row(vec!["checksum", out.checksum.as_str()])
                .add_row(vec!["payload", out.payload.as_str()]);
            println!("{table}");
            if let Some(entities) = &out.entities {
                print_entity_rows(entities);
            }
            if let Some(values) = &out.values {
                print_value_rows(values);
            }
        }
        OutputFormat::Pretty => {
            println!(
                "{}(type: {}, class: {}, command: {}, len: {}) payload={}",
                out.variant,
                out.message_type,
                out.message_class,
                out.command,
                out.length,
                out.payload
            );
            for entity in out.entities.iter().flatten() {
                println!("  entity #{} {} ({} bytes)", entity.id, entity.value_type, entity.width);
            }
            for value in out.values.iter().flatten() {
                println!("  #{} = {}", value.id, value.value);
            }
        }
        OutputFormat::Raw => println!("{}", out.wire),
    }
}

pub fn print_entities(entities: &[ReportingEntityDescriptor], format: OutputFormat) {
    let rows: Vec<EntityOutput> = entities.iter().map(EntityOutput::from).collect();
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => print_entity_rows(&rows),
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in &rows {
                println!("entity #{} {} ({} bytes)", row.id, row.value_type, row.width);
            }
        }
    }
}

#[derive(Serialize)]
struct ReportOutput {
    sequence: Option<u8>,
    values: Vec<ValueOutput>,
}

pub fn print_report(report: &Report, format: OutputFormat) {
    let out = ReportOutput {
        sequence: report.sequence,
        values: report.values.iter().map(ValueOutput::from).collect(),
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => print_value_rows(&out.values),
        OutputFormat::Pretty => {
            let fields = out
                .values
                .iter()
                .map(|v| format!("#{}={}", v.id, v.value))
                .collect::<Vec<_>>()
                .join(" ");
            match out.sequence {
                Some(seq) => println!("seq={seq} {fields}"),
                None => println!("{fields}"),
            }
        }
        OutputFormat::Raw => {
            let fields = out
                .values
                .iter()
                .map(|v| v.value.to_string())
                .collect::<Vec<_>>()
                .join(",");
            println!("{fields}");
        }
    }
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    usb_id: Option<String>,
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    let rows: Vec<PortOutput<'_>> = ports
        .iter()
        .map(|port| PortOutput {
            name: &port.name,
            kind: port.kind,
            usb_id: port
                .usb_id
                .map(|(vid, pid)| format!("{vid:04x}:{pid:04x}")),
        })
        .collect();
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "KIND", "USB ID"]);
            for row in &rows {
                table.add_row(vec![
                    row.name,
                    row.kind,
                    row.usb_id.as_deref().unwrap_or("-"),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in &rows {
                println!("{}", row.name);
            }
        }
    }
}

fn print_entity_rows(rows: &[EntityOutput]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ENTITY", "TYPE", "WIDTH"]);
    for row in rows {
        table.add_row(vec![
            row.id.to_string(),
            row.value_type.to_string(),
            row.width.to_string(),
        ]);
    }
    println!("{table}");
}

fn print_value_rows(rows: &[ValueOutput]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ENTITY", "TYPE", "VALUE"]);
    for row in rows {
        table.add_row(vec![
            row.id.to_string(),
            row.value_type.to_string(),
            row.value.to_string(),
        ]);
    }
    println!("{table}");
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

#[cfg(test)]
mod tests {
    use mecu_frame::ReportingValueType;
    use mecu_message::{MessageVariant, SendAck};

    use super::*;

    #[test]
    fn message_json_shape() {
        let message = Message::from(SendAck::request());
        let json = serde_json::to_value(MessageOutput::new(&message)).unwrap();

        assert_eq!(json["variant"], "SendAck");
        assert_eq!(json["message_type"], "REQUEST");
        assert_eq!(json["message_class"], "REPORTING");
        assert_eq!(json["command_code"], 1);
        assert_eq!(json["checksum"], "0x0102");
        assert_eq!(json["wire"], "4d450100000001000102");
        assert!(json.get("entities").is_none());
        assert!(json.get("values").is_none());
    }

    #[test]
    fn values_serialize_by_type() {
        let descriptor = ReportingEntityDescriptor::new(3, ReportingValueType::Bool8);
        let value = ReportingEntityValue {
            descriptor,
            value: ReportingValue::Bool(true),
        };
        let json = serde_json::to_value(ValueOutput::from(&value)).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["value_type"], "BOOL8");
        assert_eq!(json["value"], true);

        let value = ReportingEntityValue {
            descriptor: ReportingEntityDescriptor::new(4, ReportingValueType::Float32),
            value: ReportingValue::Float32(f32::NAN),
        };
        let json = serde_json::to_value(ValueOutput::from(&value)).unwrap();
        assert!(json["value"].is_null());
    }
}
