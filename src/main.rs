//! Binary entrypoint for the `stagesync` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // A missing .env file is normal in CI, where inputs come from the environment.
    let _ = dotenvy::dotenv();
    stagesync::init_logging();

    // Recording is handled in commands::sync via STAGESYNC_RECORD=<dir>.
    match stagesync::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
