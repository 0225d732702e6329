//! Run configuration: the YAML stage config and the per-run process inputs.
//!
//! Both are built once at startup, validated, and then passed by reference.
//! Nothing here touches the network.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = ".stagesync.yaml";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration problems that abort a run before any remote call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {reason}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        reason: String,
    },

    /// The configuration file is not valid YAML for this schema.
    #[error("failed to parse config file {path}: {reason}")]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// Underlying parse error.
        reason: String,
    },

    /// A required configuration field is empty.
    #[error("config field `{0}` must not be empty")]
    MissingField(&'static str),

    /// No branch has a target stage.
    #[error("config has no branches; at least one branch target is required")]
    NoBranches,

    /// A parent rule moves to a stage that no branch targets, so it has no id.
    #[error("parent rule for {parent_stage:?} moves to {stage:?}, which no branch targets")]
    UnresolvableStage {
        /// The rule's trigger stage.
        parent_stage: String,
        /// The `moveParentTo` value with no known id.
        stage: String,
    },

    /// A required process input was not supplied.
    #[error("missing required input: {0}")]
    MissingInput(&'static str),
}

/// The stage a merge into a branch moves its tasks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchStage {
    /// Stage name as the service displays it.
    pub target_stage: String,
    /// Identifier submitted to the service when moving a task.
    pub target_stage_id: String,
}

/// How an action counts matching subtasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Every subtask must be in the stage.
    All,
    /// At least one subtask must be in the stage.
    Some,
}

/// One candidate move inside a [`StageRule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAction {
    /// Counting mode.
    pub condition: Condition,
    /// Subtask stage being counted.
    pub subtask_stage: String,
    /// Stage the parent moves to when the condition holds.
    pub move_parent_to: String,
}

/// Actions that apply while a parent sits in `parent_stage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRule {
    /// Parent stage that activates this rule.
    pub parent_stage: String,
    /// Ordered actions; the first satisfied one wins.
    #[serde(default)]
    pub actions: Vec<RuleAction>,
}

/// Immutable stage configuration loaded from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Project (workspace) identifier in the task service.
    #[serde(default)]
    pub project_id: String,
    /// List holding the tasks and their subtasks.
    #[serde(default)]
    pub list_id: String,
    /// Base URL of the task service API, e.g. `https://tasks.example.com/v2`.
    #[serde(default)]
    pub api_base_url: String,
    /// HTTP timeout for each remote call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Whether parents are re-evaluated after their subtasks move.
    #[serde(default = "default_true")]
    pub enable_parent_rules: bool,
    /// Branch name to target stage.
    #[serde(default)]
    pub branches: BTreeMap<String, BranchStage>,
    /// Stage name to rank; higher ranks are further along.
    #[serde(default)]
    pub stage_hierarchy: HashMap<String, i64>,
    /// Parent rules in evaluation order.
    #[serde(default)]
    pub parent_rules: Vec<StageRule>,
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_true() -> bool {
    true
}

impl SyncConfig {
    /// Reads, parses and validates the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is unreadable, malformed, or invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_yaml(&content, path)
    }

    /// Parses and validates configuration text; `origin` is used in errors.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the text is malformed or invalid.
    pub fn from_yaml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks required fields and that every parent move has a stage id.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::MissingField("projectId"));
        }
        if self.list_id.trim().is_empty() {
            return Err(ConfigError::MissingField("listId"));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("apiBaseUrl"));
        }
        if self.branches.is_empty() {
            return Err(ConfigError::NoBranches);
        }
        if !self.enable_parent_rules {
            return Ok(());
        }
        for rule in &self.parent_rules {
            for action in &rule.actions {
                let known =
                    self.branches.values().any(|b| b.target_stage == action.move_parent_to);
                if !known {
                    return Err(ConfigError::UnresolvableStage {
                        parent_stage: rule.parent_stage.clone(),
                        stage: action.move_parent_to.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Per-run inputs supplied by the caller (usually a CI job).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInputs {
    /// Credential forwarded verbatim to the task service.
    pub token: String,
    /// Branch the change was merged into.
    pub branch: String,
    /// Free text (typically the pull request description) naming the tasks.
    pub body: String,
    /// Identifier of this run, shown in the summary only.
    pub run_id: String,
}

impl RunInputs {
    /// Builds run inputs, rejecting a missing credential or branch.
    ///
    /// An absent body is allowed and simply yields no task ids.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingInput`] for a blank token or branch.
    pub fn new(
        token: Option<String>,
        branch: Option<String>,
        body: Option<String>,
        run_id: String,
    ) -> Result<Self, ConfigError> {
        let token =
            token.filter(|t| !t.trim().is_empty()).ok_or(ConfigError::MissingInput("token"))?;
        let branch =
            branch.filter(|b| !b.trim().is_empty()).ok_or(ConfigError::MissingInput("branch"))?;
        Ok(Self { token, branch, body: body.unwrap_or_default(), run_id })
    }
}
