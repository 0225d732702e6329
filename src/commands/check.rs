//! `stagesync check` command.

use std::fmt::Write as _;
use std::path::Path;

use crate::config::SyncConfig;

/// Execute the `check` command: load, validate and describe the configuration.
///
/// # Errors
///
/// Returns an error string if the file cannot be read, parsed or validated.
pub fn run(path: &Path) -> Result<(), String> {
    let config = SyncConfig::load(path).map_err(|e| e.to_string())?;
    print!("{}", describe(&config));
    Ok(())
}

fn describe(config: &SyncConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Project {} / list {}", config.project_id, config.list_id);
    let _ = writeln!(out, "Branches:");
    for (branch, stage) in &config.branches {
        let _ = writeln!(out, "  {branch} -> {} ({})", stage.target_stage, stage.target_stage_id);
    }

    let mut ranks: Vec<(&String, &i64)> = config.stage_hierarchy.iter().collect();
    ranks.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)));
    if ranks.is_empty() {
        let _ = writeln!(out, "Stage hierarchy: empty, every move is allowed");
    } else {
        let _ = writeln!(out, "Stage hierarchy:");
        for (stage, rank) in ranks {
            let _ = writeln!(out, "  {rank:>3}  {stage}");
        }
    }

    let actions: usize = config.parent_rules.iter().map(|r| r.actions.len()).sum();
    let state = if config.enable_parent_rules { "enabled" } else { "disabled" };
    let _ = writeln!(
        out,
        "Parent rules: {} ({actions} actions, {state})",
        config.parent_rules.len()
    );
    out
}
