//! Stage directory: branch targets, stage ids and stage ranks.

use crate::config::{BranchStage, SyncConfig};

/// Read-only view over the stage parts of a [`SyncConfig`].
#[derive(Debug, Clone, Copy)]
pub struct StageDirectory<'a> {
    config: &'a SyncConfig,
}

impl<'a> StageDirectory<'a> {
    /// Creates a directory backed by the given configuration.
    #[must_use]
    pub const fn new(config: &'a SyncConfig) -> Self {
        Self { config }
    }

    /// Returns the target stage configured for `branch`, if any.
    #[must_use]
    pub fn target_for_branch(&self, branch: &str) -> Option<&'a BranchStage> {
        self.config.branches.get(branch)
    }

    /// Resolves a stage name to its id.
    ///
    /// Only branch target stages are known; a name that appears solely in the
    /// hierarchy or in parent rules has no id.
    #[must_use]
    pub fn stage_id_for_name(&self, name: &str) -> Option<&'a str> {
        self.config
            .branches
            .values()
            .find(|b| b.target_stage == name)
            .map(|b| b.target_stage_id.as_str())
    }

    /// Rank of a stage; unranked names rank 0.
    #[must_use]
    pub fn rank(&self, stage: &str) -> i64 {
        self.config.stage_hierarchy.get(stage).copied().unwrap_or(0)
    }

    /// Whether moving from `current` to `target` does not go backwards.
    ///
    /// An empty hierarchy allows every move.
    #[must_use]
    pub fn is_forward(&self, current: &str, target: &str) -> bool {
        if self.config.stage_hierarchy.is_empty() {
            return true;
        }
        self.rank(target) >= self.rank(current)
    }
}
