//! tsm - treesmith command-line entry point

use std::process::ExitCode;

use treesmith::cli;
use treesmith::ui::output;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{err:#}"));
            ExitCode::from(cli::exit_code(&err))
        }
    }
}
