use urlfetch_core::logging;

mod cli;

use crate::cli::CliCommand;

fn main() {
    // Initialize logging as early as possible; stderr if the state dir is unusable.
    if let Err(file_err) = logging::init_logging() {
        match logging::init_logging_stderr() {
            Ok(()) => tracing::warn!("log file unavailable, logging to stderr: {:#}", file_err),
            Err(e) => eprintln!("urlfetch: logging disabled: {:#}", e),
        }
    }

    if let Err(err) = CliCommand::run_from_args() {
        eprintln!("urlfetch error: {:#}", err);
        std::process::exit(1);
    }
}
