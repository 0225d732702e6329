//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

/// Top-level CLI parser for `stagesync`.
#[derive(Debug, Parser)]
#[command(name = "stagesync", version, about = "Move tracker tasks through stages on merge")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Move the tasks named in a pull request and reconcile their parents.
    Sync(SyncArgs),
    /// Print the task ids found in a pull request description.
    Extract {
        /// Where to read the description from.
        #[command(flatten)]
        body: BodyArgs,
    },
    /// Validate the configuration file and print its stage tables.
    Check {
        /// Path to the YAML configuration.
        #[arg(long, env = "STAGESYNC_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

/// Arguments of `stagesync sync`.
#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Path to the YAML configuration.
    #[arg(long, env = "STAGESYNC_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Credential forwarded verbatim to the task service.
    #[arg(long, env = "STAGESYNC_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Branch the pull request was merged into.
    #[arg(long, env = "STAGESYNC_BRANCH")]
    pub branch: Option<String>,

    /// Where to read the pull request description from.
    #[command(flatten)]
    pub body: BodyArgs,

    /// Identifier shown in the summary; a random one is generated if absent.
    #[arg(long, env = "STAGESYNC_RUN_ID")]
    pub run_id: Option<String>,

    /// Read everything but send no updates.
    #[arg(long)]
    pub dry_run: bool,
}

/// Source of the pull request description.
#[derive(Debug, Args)]
pub struct BodyArgs {
    /// Description text.
    #[arg(long, env = "STAGESYNC_BODY")]
    pub body: Option<String>,

    /// File holding the description; takes precedence over `--body`.
    #[arg(long)]
    pub body_file: Option<PathBuf>,
}

impl BodyArgs {
    /// Returns the description, or `None` if neither source was given.
    ///
    /// # Errors
    ///
    /// Returns an error if `--body-file` cannot be read.
    pub fn read(&self) -> Result<Option<String>, String> {
        match &self.body_file {
            Some(path) => std::fs::read_to_string(path)
                .map(Some)
                .map_err(|e| format!("Failed to read body file {}: {e}", path.display())),
            None => Ok(self.body.clone()),
        }
    }
}
