//! `stagesync extract` command.

use crate::cli::BodyArgs;
use crate::extract::{extract_task_ids, TASKS_HEADER};

/// Execute the `extract` command, printing one task id per line.
///
/// # Errors
///
/// Returns an error string if the body file cannot be read.
pub fn run(body: &BodyArgs) -> Result<(), String> {
    let text = body.read()?.unwrap_or_default();
    println!("{}", render(&extract_task_ids(&text)));
    Ok(())
}

fn render(ids: &[String]) -> String {
    if ids.is_empty() {
        format!("No task ids found under a \"{TASKS_HEADER}\" section.")
    } else {
        ids.join("\n")
    }
}
