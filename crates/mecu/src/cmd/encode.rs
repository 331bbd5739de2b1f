use mecu_frame::{CommandCode, Frame, MessageClass, MessageType};
use mecu_message::default_registry;

use crate::cmd::{Direction, EncodeArgs};
use crate::exit::{frame_error, message_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, MessageOutput, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let class = parse_class(&args.class)?;
    let command = CommandCode::parse(class, &args.command)
        .map_err(|err| CliError::new(USAGE, err.to_string()))?;
    let payload: String = args.payload.split_whitespace().collect();
    let payload = hex::decode(&payload)
        .map_err(|err| CliError::new(USAGE, format!("invalid payload hex: {err}")))?;
    let message_type = match args.direction {
        Direction::Request => MessageType::Request,
        Direction::Response => MessageType::Response,
    };

    let frame = Frame::new(message_type, class, command, payload)
        .map_err(|err| frame_error("encode failed", err))?;
    tracing::debug!(frame = %frame, "encoded");
    let message = default_registry()
        .dispatch_frame(frame)
        .map_err(|err| message_error("encode failed", err))?;

    print_message(&MessageOutput::new(&message), format);
    Ok(SUCCESS)
}

fn parse_class(input: &str) -> CliResult<MessageClass> {
    if let Ok(class) = input.parse::<MessageClass>() {
        return Ok(class);
    }
    let trimmed = input.trim();
    let code = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => trimmed.parse(),
    }
    .map_err(|_| CliError::new(USAGE, format!("unknown message class {input:?}")))?;
    MessageClass::from_code(code).map_err(|err| CliError::new(USAGE, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_by_name_or_code() {
        assert_eq!(parse_class("system").unwrap(), MessageClass::System);
        assert_eq!(parse_class("4").unwrap(), MessageClass::System);
        assert_eq!(parse_class("0x00").unwrap(), MessageClass::Reporting);
        assert_eq!(parse_class("9").unwrap_err().code, USAGE);
        assert_eq!(parse_class("engine").unwrap_err().code, USAGE);
    }
}
