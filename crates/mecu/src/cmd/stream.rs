use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cmd::StreamArgs;
use crate::exit::{session_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_entities, print_report, OutputFormat};

pub fn run(args: StreamArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = args.port.open_session(!args.no_ack)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let entities = session
        .enable_reporting()
        .map_err(|err| session_error("enable reporting failed", err))?;
    print_entities(entities, format);

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let mut report = match session.next_report() {
            Ok(report) => report,
            Err(err) if err.is_timeout() => continue,
            Err(err) => {
                if let Err(disable_err) = session.disable_reporting() {
                    tracing::warn!(error = %disable_err, "failed to disable reporting");
                }
                return Err(session_error("report failed", err));
            }
        };

        if let Some(ids) = &args.ids {
            report.values.retain(|value| ids.contains(&value.id()));
        }
        print_report(&report, format);
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    if let Err(err) = session.disable_reporting() {
        tracing::warn!(error = %err, "failed to disable reporting");
    }
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
