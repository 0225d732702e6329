//! Per-task and per-parent results and the run summary built from them.

use std::fmt;

use chrono::{DateTime, Utc};

/// What happened to a task named in the pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task was moved to the branch's target stage.
    Moved {
        /// Stage the task was in before the move.
        from: String,
    },
    /// Dry run: the task would have been moved.
    WouldMove {
        /// Stage the task is in.
        from: String,
    },
    /// The task already sat in the target stage; nothing was written.
    AlreadyInStage,
    /// Fetching or updating the task failed.
    Failed {
        /// Error detail.
        error: String,
    },
}

/// Result for one directly addressed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    /// Task identifier.
    pub task_id: String,
    /// What happened.
    pub outcome: TaskOutcome,
}

impl TaskResult {
    /// Whether the task ended up (or would end up) in the target stage.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        !matches!(self.outcome, TaskOutcome::Failed { .. })
    }
}

/// What happened to a parent re-evaluated after its subtasks moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentOutcome {
    /// The parent was moved.
    Moved {
        /// Previous stage.
        from: String,
        /// New stage.
        to: String,
        /// Rule that fired.
        reason: String,
    },
    /// Dry run: the parent would have been moved.
    WouldMove {
        /// Current stage.
        from: String,
        /// Stage the rule chose.
        to: String,
        /// Rule that fired.
        reason: String,
    },
    /// A rule fired but the move would go backwards, so it was not applied.
    Skipped {
        /// Current stage.
        from: String,
        /// Stage the rule chose.
        to: String,
        /// Rule that fired.
        reason: String,
    },
    /// A rule fired for the stage the parent is already in.
    AlreadyInStage {
        /// Current stage.
        stage: String,
    },
    /// No rule or action applied to the parent.
    NoChange {
        /// Current stage.
        stage: String,
    },
    /// The parent has no subtasks in the list.
    NoSubtasks,
    /// Fetching, listing or updating failed.
    Failed {
        /// Error detail.
        error: String,
    },
}

/// Result for one parent task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentResult {
    /// Parent identifier.
    pub parent_id: String,
    /// What happened.
    pub outcome: ParentOutcome,
}

impl ParentResult {
    /// Whether processing the parent finished without a remote failure.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        !matches!(self.outcome, ParentOutcome::Failed { .. })
    }

    /// Whether the parent was moved (or would be, in a dry run).
    #[must_use]
    pub const fn updated(&self) -> bool {
        matches!(self.outcome, ParentOutcome::Moved { .. } | ParentOutcome::WouldMove { .. })
    }

    /// Whether the forward-movement guard blocked the rule's move.
    #[must_use]
    pub const fn skipped(&self) -> bool {
        matches!(self.outcome, ParentOutcome::Skipped { .. })
    }
}

/// Everything a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Run identifier, for display.
    pub run_id: String,
    /// Branch the change was merged into.
    pub branch: String,
    /// Stage the branch moves tasks to.
    pub target_stage: String,
    /// Whether updates were suppressed.
    pub dry_run: bool,
    /// When processing started.
    pub started_at: DateTime<Utc>,
    /// When processing finished.
    pub finished_at: DateTime<Utc>,
    /// Results for tasks named in the text, in processing order.
    pub tasks: Vec<TaskResult>,
    /// Results for parents, in processing order.
    pub parents: Vec<ParentResult>,
}

impl RunSummary {
    /// Number of tasks processed.
    #[must_use]
    pub fn tasks_attempted(&self) -> usize {
        self.tasks.len()
    }

    /// Number of tasks that succeeded.
    #[must_use]
    pub fn tasks_succeeded(&self) -> usize {
        self.tasks.iter().filter(|t| t.succeeded()).count()
    }

    /// Number of tasks that failed.
    #[must_use]
    pub fn tasks_failed(&self) -> usize {
        self.tasks_attempted() - self.tasks_succeeded()
    }

    /// Number of parents moved.
    #[must_use]
    pub fn parents_updated(&self) -> usize {
        self.parents.iter().filter(|p| p.updated()).count()
    }

    /// Number of parents whose move was blocked by the guard.
    #[must_use]
    pub fn parents_skipped(&self) -> usize {
        self.parents.iter().filter(|p| p.skipped()).count()
    }

    /// Number of parents that failed.
    #[must_use]
    pub fn parents_failed(&self) -> usize {
        self.parents.iter().filter(|p| !p.succeeded()).count()
    }

    /// Whether the run should exit with failure.
    ///
    /// Only direct task failures count; parent failures are reported but
    /// never fail the run.
    #[must_use]
    pub fn has_task_failures(&self) -> bool {
        self.tasks_failed() > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.dry_run { " (dry run)" } else { "" };
        writeln!(f, "Stage sync {}{mode}", self.run_id)?;
        writeln!(f, "Branch: {} -> {}", self.branch, self.target_stage)?;
        writeln!(
            f,
            "Tasks: {} attempted, {} succeeded, {} failed",
            self.tasks_attempted(),
            self.tasks_succeeded(),
            self.tasks_failed()
        )?;
        for task in &self.tasks {
            let line = match &task.outcome {
                TaskOutcome::Moved { from } => format!("moved from {from}"),
                TaskOutcome::WouldMove { from } => format!("would move from {from}"),
                TaskOutcome::AlreadyInStage => "already in stage".to_string(),
                TaskOutcome::Failed { error } => format!("FAILED: {error}"),
            };
            writeln!(f, "  #{} {line}", task.task_id)?;
        }

        if !self.parents.is_empty() {
            writeln!(
                f,
                "Parents: {} updated, {} skipped, {} failed",
                self.parents_updated(),
                self.parents_skipped(),
                self.parents_failed()
            )?;
            for parent in &self.parents {
                let line = match &parent.outcome {
                    ParentOutcome::Moved { from, to, reason } => {
                        format!("moved {from} -> {to} ({reason})")
                    }
                    ParentOutcome::WouldMove { from, to, reason } => {
                        format!("would move {from} -> {to} ({reason})")
                    }
                    ParentOutcome::Skipped { from, to, .. } => {
                        format!("skipped {from} -> {to}: would move backwards")
                    }
                    ParentOutcome::AlreadyInStage { stage } => format!("already in {stage}"),
                    ParentOutcome::NoChange { stage } => format!("no rule applies in {stage}"),
                    ParentOutcome::NoSubtasks => "no subtasks".to_string(),
                    ParentOutcome::Failed { error } => format!("FAILED: {error}"),
                };
                writeln!(f, "  #{} {line}", parent.parent_id)?;
            }
        }

        let elapsed = self.finished_at - self.started_at;
        write!(f, "Finished in {}ms", elapsed.num_milliseconds())
    }
}
