use mecu_frame::{Frame, FrameConfig, FrameError, ReportingValueType};
use mecu_message::{Message, MessageRegistry, ReportingEntityDescriptor};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, message_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, MessageOutput, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let entities = parse_entities(&args.entities)?;
    let input: String = args
        .hex
        .iter()
        .flat_map(|chunk| chunk.chars())
        .filter(|c| !c.is_whitespace())
        .collect();
    let bytes = hex::decode(&input)
        .map_err(|err| frame_error("invalid input", FrameError::InvalidHex(err)))?;

    let config = FrameConfig {
        checksum_policy: args.checksum_policy(),
        ..FrameConfig::default()
    };
    let registry = MessageRegistry::builtin().with_frame_config(config.clone());

    let mut rest = bytes.as_slice();
    let mut index = 0usize;
    while !rest.is_empty() {
        let context = format!("frame {index} (offset {})", bytes.len() - rest.len());
        let frame = Frame::decode_with_config(rest, &config)
            .map_err(|err| frame_error(&context, err))?;
        rest = &rest[frame.wire_size()..];

        let message = registry
            .dispatch_frame(frame)
            .map_err(|err| message_error(&context, err))?;
        let mut out = MessageOutput::new(&message);
        if let Message::SendReport(report) = &message {
            if !entities.is_empty() {
                let values = report
                    .parse_report(&entities)
                    .map_err(|err| message_error(&context, err))?;
                out = out.with_values(&values);
            }
        }
        print_message(&out, format);
        index += 1;
    }

    Ok(SUCCESS)
}

/// Parse `id:type` pairs such as `1:uint16` or `0x0e:int8`.
pub fn parse_entities(specs: &[String]) -> CliResult<Vec<ReportingEntityDescriptor>> {
    specs
        .iter()
        .filter(|spec| !spec.trim().is_empty())
        .map(|spec| {
            let (id, value_type) = spec.split_once(':').ok_or_else(|| {
                CliError::new(USAGE, format!("entity {spec:?} must look like ID:TYPE"))
            })?;
            let id = parse_number(id)
                .ok_or_else(|| CliError::new(USAGE, format!("invalid entity id {id:?}")))?;
            let value_type: ReportingValueType = value_type
                .parse()
                .map_err(|err| CliError::new(USAGE, format!("{err}")))?;
            Ok(ReportingEntityDescriptor::new(id, value_type))
        })
        .collect()
}

fn parse_number(input: &str) -> Option<u16> {
    let input = input.trim();
    match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => input.parse().ok(),
    }
}
