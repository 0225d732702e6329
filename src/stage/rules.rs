//! Parent-rule evaluation.
//!
//! Given a parent's stage and its subtasks' stages, picks at most one stage
//! for the parent to move to. Rules and actions are both first-match: the
//! first rule whose `parentStage` matches is the only rule consulted, and
//! the first satisfied action in it decides the move.

use crate::config::{Condition, RuleAction, SyncConfig};

use super::directory::StageDirectory;

/// The move chosen for a parent task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentDecision {
    /// Stage name the parent should move to.
    pub target_stage: String,
    /// Id of that stage, when the directory knows it.
    pub target_stage_id: Option<String>,
    /// Which condition fired, for the run summary.
    pub reason: String,
}

/// Decides where a parent in `parent_stage` should move, if anywhere.
///
/// `subtask_stages` must not be empty; a parent without subtasks is never
/// evaluated.
#[must_use]
pub fn evaluate(
    config: &SyncConfig,
    parent_stage: &str,
    subtask_stages: &[&str],
) -> Option<ParentDecision> {
    let rule = config.parent_rules.iter().find(|r| r.parent_stage == parent_stage)?;
    let total = subtask_stages.len();

    let action = rule.actions.iter().find(|action| {
        let count = subtask_stages.iter().filter(|s| **s == action.subtask_stage).count();
        is_satisfied(action.condition, count, total)
    })?;

    let directory = StageDirectory::new(config);
    Some(ParentDecision {
        target_stage: action.move_parent_to.clone(),
        target_stage_id: directory.stage_id_for_name(&action.move_parent_to).map(String::from),
        reason: describe(action, parent_stage),
    })
}

const fn is_satisfied(condition: Condition, count: usize, total: usize) -> bool {
    match condition {
        Condition::All => total > 0 && count == total,
        Condition::Some => count > 0,
    }
}

fn describe(action: &RuleAction, parent_stage: &str) -> String {
    let quantifier = match action.condition {
        Condition::All => "all subtasks are",
        Condition::Some => "at least one subtask is",
    };
    format!(
        "parent in {parent_stage:?} and {quantifier} in {:?}: move to {:?}",
        action.subtask_stage, action.move_parent_to
    )
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn config(rules: &str) -> SyncConfig {
        let yaml = format!(
            "projectId: p\nlistId: l\napiBaseUrl: http://localhost\nbranches:\n  \
             main: {{ targetStage: Completed, targetStageId: C1 }}\n  \
             development: {{ targetStage: QA, targetStageId: Q1 }}\nparentRules:\n{rules}"
        );
        SyncConfig::from_yaml(&yaml, Path::new("rules.yaml")).unwrap()
    }

    const TO_DO_ALL_DONE: &str = "  - parentStage: To Do\n    actions:\n      \
        - { condition: all, subtaskStage: Done, moveParentTo: Completed }\n";

    #[test]
    fn all_condition_fires_when_every_subtask_matches() {
        let cfg = config(TO_DO_ALL_DONE);
        let decision = evaluate(&cfg, "To Do", &["Done", "Done"]).unwrap();
        assert_eq!(decision.target_stage, "Completed");
        assert_eq!(decision.target_stage_id.as_deref(), Some("C1"));
        assert!(decision.reason.contains("all subtasks"));
        assert!(decision.reason.contains("\"Done\""));
    }

    #[test]
    fn all_condition_does_not_fire_on_partial_match() {
        let cfg = config(TO_DO_ALL_DONE);
        assert_eq!(evaluate(&cfg, "To Do", &["Done", "Pending"]), None);
    }

    #[test]
    fn all_condition_never_fires_without_subtasks() {
        let cfg = config(TO_DO_ALL_DONE);
        assert_eq!(evaluate(&cfg, "To Do", &[]), None);
    }

    #[test]
    fn unmatched_parent_stage_yields_nothing() {
        let cfg = config(TO_DO_ALL_DONE);
        assert_eq!(evaluate(&cfg, "In Progress", &["Done"]), None);
    }

    #[test]
    fn first_satisfied_action_wins() {
        let cfg = config(
            "  - parentStage: To Do\n    actions:\n      \
             - { condition: some, subtaskStage: X, moveParentTo: QA }\n      \
             - { condition: all, subtaskStage: X, moveParentTo: Completed }\n",
        );
        let decision = evaluate(&cfg, "To Do", &["X", "X", "X"]).unwrap();
        assert_eq!(decision.target_stage, "QA");
        assert!(decision.reason.contains("at least one subtask"));
    }

    #[test]
    fn later_action_fires_when_earlier_ones_fail() {
        let cfg = config(
            "  - parentStage: To Do\n    actions:\n      \
             - { condition: all, subtaskStage: Done, moveParentTo: Completed }\n      \
             - { condition: some, subtaskStage: Done, moveParentTo: QA }\n",
        );
        let decision = evaluate(&cfg, "To Do", &["Done", "Dev"]).unwrap();
        assert_eq!(decision.target_stage, "QA");
    }

    #[test]
    fn only_first_matching_rule_is_consulted() {
        let cfg = config(
            "  - parentStage: To Do\n    actions:\n      \
             - { condition: all, subtaskStage: Done, moveParentTo: Completed }\n  \
             - parentStage: To Do\n    actions:\n      \
             - { condition: some, subtaskStage: Dev, moveParentTo: QA }\n",
        );
        assert_eq!(evaluate(&cfg, "To Do", &["Dev"]), None);
    }

    #[test]
    fn unknown_target_has_no_stage_id() {
        let mut cfg = config(TO_DO_ALL_DONE);
        cfg.parent_rules[0].actions[0].move_parent_to = "Archived".into();
        let decision = evaluate(&cfg, "To Do", &["Done"]).unwrap();
        assert_eq!(decision.target_stage, "Archived");
        assert_eq!(decision.target_stage_id, None);
    }
}
