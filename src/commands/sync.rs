//! `stagesync sync` command.

use std::env;
use std::path::PathBuf;

use tokio::runtime::{Builder, Runtime};
use uuid::Uuid;

use crate::cassette::session::RecordingSession;
use crate::cli::SyncArgs;
use crate::config::{RunInputs, SyncConfig};
use crate::context::ServiceContext;
use crate::reconcile::{Reconciler, RunOutcome};

/// Environment variable naming the directory that receives recorded cassettes.
pub const RECORD_ENV: &str = "STAGESYNC_RECORD";

/// Execute the `sync` command.
///
/// When `STAGESYNC_RECORD` is set to a directory path, every task service
/// call and clock reading is recorded to cassette files under it.
///
/// # Errors
///
/// Returns an error string if an input is missing, the configuration is
/// invalid, or any directly named task failed to move.
pub fn run(args: &SyncArgs) -> Result<(), String> {
    let run_id = args.run_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
    let inputs = RunInputs::new(args.token.clone(), args.branch.clone(), args.body.read()?, run_id)
        .map_err(|e| e.to_string())?;
    let config = SyncConfig::load(&args.config).map_err(|e| e.to_string())?;

    let (ctx, session) = if let Ok(root) = env::var(RECORD_ENV) {
        let (ctx, session) =
            ServiceContext::recording_at(&PathBuf::from(root), &config, &inputs.token)?;
        (ctx, Some(session))
    } else {
        (ServiceContext::live(&config, &inputs.token)?, None)
    };

    let result = run_with_context(&ctx, &config, &inputs, args.dry_run);

    if let Some(session) = session {
        // The recording adapters hold the session's buffers until dropped.
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Runs one sync against the given context and prints its report.
///
/// # Errors
///
/// Returns an error string if the runtime cannot start or a named task failed.
pub fn run_with_context(
    ctx: &ServiceContext,
    config: &SyncConfig,
    inputs: &RunInputs,
    dry_run: bool,
) -> Result<(), String> {
    let runtime = build_runtime()?;
    let outcome = runtime.block_on(Reconciler::new(ctx, config).dry_run(dry_run).run(inputs));
    print!("{}", render(&outcome));

    match &outcome {
        RunOutcome::Completed(summary) if outcome.is_failure() => Err(format!(
            "{} of {} tasks failed to move",
            summary.tasks_failed(),
            summary.tasks_attempted()
        )),
        _ => Ok(()),
    }
}

fn build_runtime() -> Result<Runtime, String> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))
}

fn render(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::UnconfiguredBranch { branch } => {
            format!("Branch {branch} has no target stage; nothing to do.\n")
        }
        RunOutcome::NoTaskIds => "No task ids found in the description; nothing to do.\n".into(),
        RunOutcome::Completed(summary) => summary.to_string(),
    }
}

fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}
