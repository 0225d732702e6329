//! Reconciliation: move the tasks named in a merge, then re-evaluate their parents.
//!
//! A run has two strictly ordered phases. Phase one moves every directly
//! named task to the branch's target stage and collects their parents.
//! Phase two evaluates each distinct parent once against the parent rules.
//! A failed remote call only fails the task or parent it belongs to.

pub mod summary;

use std::collections::HashSet;

use crate::config::{BranchStage, RunInputs, SyncConfig};
use crate::context::ServiceContext;
use crate::extract::extract_task_ids;
use crate::stage::{evaluate, StageDirectory};

pub use summary::{ParentOutcome, ParentResult, RunSummary, TaskOutcome, TaskResult};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The branch has no target stage; nothing to do.
    UnconfiguredBranch {
        /// The branch that was merged into.
        branch: String,
    },
    /// The text named no tasks; nothing to do.
    NoTaskIds,
    /// Tasks were processed.
    Completed(RunSummary),
}

impl RunOutcome {
    /// Whether the process should exit with failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        match self {
            Self::Completed(summary) => summary.has_task_failures(),
            Self::UnconfiguredBranch { .. } | Self::NoTaskIds => false,
        }
    }
}

/// Drives one sync run against a [`ServiceContext`].
pub struct Reconciler<'a> {
    ctx: &'a ServiceContext,
    config: &'a SyncConfig,
    dry_run: bool,
}

impl<'a> Reconciler<'a> {
    /// Creates a reconciler over an already validated configuration.
    #[must_use]
    pub const fn new(ctx: &'a ServiceContext, config: &'a SyncConfig) -> Self {
        Self { ctx, config, dry_run: false }
    }

    /// When set, every read happens but no update is sent.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Runs both phases for the tasks named in `inputs.body`.
    pub async fn run(&self, inputs: &RunInputs) -> RunOutcome {
        let directory = StageDirectory::new(self.config);
        let Some(target) = directory.target_for_branch(&inputs.branch) else {
            tracing::info!(branch = %inputs.branch, "branch has no target stage, nothing to do");
            return RunOutcome::UnconfiguredBranch { branch: inputs.branch.clone() };
        };

        let task_ids = extract_task_ids(&inputs.body);
        if task_ids.is_empty() {
            tracing::info!("no task ids found in the description");
            return RunOutcome::NoTaskIds;
        }

        let started_at = self.ctx.clock.now();
        tracing::info!(
            run_id = %inputs.run_id,
            branch = %inputs.branch,
            target = %target.target_stage,
            tasks = task_ids.len(),
            dry_run = self.dry_run,
            "starting stage sync"
        );

        let mut pending_parents = Vec::new();
        let mut seen_parents = HashSet::new();
        let mut tasks = Vec::with_capacity(task_ids.len());
        for id in &task_ids {
            let (result, parent) = self.sync_task(id, target).await;
            tasks.push(result);
            if let Some(parent) = parent.filter(|_| self.config.enable_parent_rules) {
                if seen_parents.insert(parent.clone()) {
                    pending_parents.push(parent);
                }
            }
        }

        let mut parents = Vec::with_capacity(pending_parents.len());
        for parent_id in &pending_parents {
            parents.push(self.reconcile_parent(parent_id).await);
        }

        RunOutcome::Completed(RunSummary {
            run_id: inputs.run_id.clone(),
            branch: inputs.branch.clone(),
            target_stage: target.target_stage.clone(),
            dry_run: self.dry_run,
            started_at,
            finished_at: self.ctx.clock.now(),
            tasks,
            parents,
        })
    }

    /// Moves one task to the branch target; also returns its parent id, if any.
    async fn sync_task(&self, id: &str, target: &BranchStage) -> (TaskResult, Option<String>) {
        let task = match self.ctx.tasks.fetch_task(id).await {
            Ok(task) => task,
            Err(e) => {
                tracing::warn!(task_id = %id, error = %e, "failed to fetch task");
                let outcome = TaskOutcome::Failed { error: format!("fetch failed: {e}") };
                return (TaskResult { task_id: id.to_string(), outcome }, None);
            }
        };
        let parent = task.parent().map(String::from);
        let current = task.stage_name();

        let outcome = if current == target.target_stage {
            tracing::info!(task_id = %id, stage = %current, "task already in target stage");
            TaskOutcome::AlreadyInStage
        } else if self.dry_run {
            tracing::info!(
                task_id = %id,
                from = %current,
                to = %target.target_stage,
                "would move task"
            );
            TaskOutcome::WouldMove { from: current.to_string() }
        } else {
            match self.ctx.tasks.update_task_stage(id, &target.target_stage_id).await {
                Ok(()) => {
                    tracing::info!(
                        task_id = %id,
                        from = %current,
                        to = %target.target_stage,
                        "moved task"
                    );
                    TaskOutcome::Moved { from: current.to_string() }
                }
                Err(e) => {
                    tracing::warn!(task_id = %id, error = %e, "failed to update task");
                    TaskOutcome::Failed { error: format!("update failed: {e}") }
                }
            }
        };

        (TaskResult { task_id: id.to_string(), outcome }, parent)
    }

    /// Re-evaluates one parent against the parent rules and applies the result.
    async fn reconcile_parent(&self, parent_id: &str) -> ParentResult {
        let outcome = self.parent_outcome(parent_id).await;
        if let ParentOutcome::Failed { error } = &outcome {
            tracing::warn!(parent_id = %parent_id, error = %error, "parent not reconciled");
        }
        ParentResult { parent_id: parent_id.to_string(), outcome }
    }

    async fn parent_outcome(&self, parent_id: &str) -> ParentOutcome {
        let parent = match self.ctx.tasks.fetch_task(parent_id).await {
            Ok(parent) => parent,
            Err(e) => return ParentOutcome::Failed { error: format!("fetch failed: {e}") },
        };
        let subtasks = match self.ctx.tasks.list_tasks_with_parent(parent_id).await {
            Ok(subtasks) => subtasks,
            Err(e) => {
                return ParentOutcome::Failed { error: format!("listing subtasks failed: {e}") }
            }
        };

        let stages: Vec<&str> =
            subtasks.iter().filter(|t| t.id != parent_id).map(|t| t.stage_name()).collect();
        if stages.is_empty() {
            tracing::info!(parent_id = %parent_id, "parent has no subtasks");
            return ParentOutcome::NoSubtasks;
        }

        let current = parent.stage_name();
        let Some(decision) = evaluate(self.config, current, &stages) else {
            tracing::info!(parent_id = %parent_id, stage = %current, "no parent rule applies");
            return ParentOutcome::NoChange { stage: current.to_string() };
        };

        let directory = StageDirectory::new(self.config);
        let (from, to, reason) =
            (current.to_string(), decision.target_stage.clone(), decision.reason.clone());
        if !directory.is_forward(current, &decision.target_stage) {
            tracing::info!(
                parent_id = %parent_id,
                from = %from,
                to = %to,
                "parent move would go backwards, skipped"
            );
            return ParentOutcome::Skipped { from, to, reason };
        }
        if decision.target_stage == current {
            return ParentOutcome::AlreadyInStage { stage: from };
        }
        let Some(stage_id) = decision.target_stage_id.as_deref() else {
            return ParentOutcome::Failed { error: format!("no stage id known for {to:?}") };
        };
        if self.dry_run {
            tracing::info!(parent_id = %parent_id, from = %from, to = %to, "would move parent");
            return ParentOutcome::WouldMove { from, to, reason };
        }

        match self.ctx.tasks.update_task_stage(parent_id, stage_id).await {
            Ok(()) => {
                tracing::info!(
                    parent_id = %parent_id,
                    from = %from,
                    to = %to,
                    reason = %reason,
                    "moved parent"
                );
                ParentOutcome::Moved { from, to, reason }
            }
            Err(e) => ParentOutcome::Failed { error: format!("update failed: {e}") },
        }
    }
}
