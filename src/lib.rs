//! Core library entry for the `stagesync` CLI.
//!
//! `stagesync` moves tasks in a project-management service to the stage a
//! branch maps to when a pull request merges, then re-evaluates each affected
//! parent task against ordered parent rules.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod extract;
pub mod ports;
pub mod reconcile;
pub mod stage;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails, configuration is
/// invalid, or any directly named task could not be moved.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        // --help and --version are not failures.
        Err(err) if !err.use_stderr() => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    commands::dispatch(&cli.command)
}

/// Install the stderr log subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_extracts_ids_without_config() {
        let result = run(["stagesync", "extract", "--body", "## Tasks\n#123456789"]);
        assert!(result.is_ok());
    }

    #[test]
    fn run_errors_on_unknown_subcommand() {
        let result = run(["stagesync", "unknown"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_treats_help_as_success() {
        assert!(run(["stagesync", "sync", "--help"]).is_ok());
    }

    #[test]
    fn run_errors_on_missing_config_file() {
        let result = run(["stagesync", "check", "--config", "/nonexistent/stagesync.yaml"]);
        assert!(result.unwrap_err().contains("failed to read config file"));
    }
}
