use mecu_message::{HashMode, Message};

use crate::cmd::{HashArgs, HashModeArg};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_message, MessageOutput, OutputFormat};

pub fn run(args: HashArgs, format: OutputFormat) -> CliResult<i32> {
    let mode = match args.mode {
        HashModeArg::Overall => HashMode::Overall,
        HashModeArg::Detailed => HashMode::Detailed,
    };
    let mut session = args.port.open_session(false)?;
    let hash = session
        .hash(mode)
        .map_err(|err| session_error("hash request failed", err))?;

    print_message(&MessageOutput::new(&Message::from(hash)), format);
    Ok(SUCCESS)
}
