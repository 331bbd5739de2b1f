use mecu_message::Message;

use crate::cmd::InfoArgs;
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_message, MessageOutput, OutputFormat};

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = args.port.open_session(false)?;
    let info = session
        .ecu_info()
        .map_err(|err| session_error("ECU info request failed", err))?;

    print_message(&MessageOutput::new(&Message::from(info)), format);
    Ok(SUCCESS)
}
