//! Task tracker port for reading and moving tasks in the remote service.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stage name reported for tasks whose stage is missing.
pub const UNKNOWN_STAGE: &str = "Unknown";

/// Boxed future type alias used by [`TaskTracker`] to keep the trait dyn-compatible.
pub type TaskFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TrackerError>> + Send + 'a>>;

/// The workflow stage a task currently sits in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Display name of the stage; the service may omit it.
    #[serde(default)]
    pub name: Option<String>,
}

/// A task as seen by the reconciliation engine.
///
/// Owned by the remote service. Only `stage` is ever written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier of the task in the remote service.
    pub id: String,
    /// Current stage, if the service reported one.
    #[serde(default)]
    pub stage: Option<Stage>,
    /// Identifier of the parent task, if this task is a subtask.
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl Task {
    /// Returns the current stage name, or [`UNKNOWN_STAGE`] when absent.
    #[must_use]
    pub fn stage_name(&self) -> &str {
        self.stage.as_ref().and_then(|s| s.name.as_deref()).unwrap_or(UNKNOWN_STAGE)
    }

    /// Returns the parent identifier; `None` means the task has no parent.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Failure of a single remote call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrackerError {
    /// The request could not be sent or the response could not be read.
    #[error("request to task service failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("task service returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("unexpected response from task service: {0}")]
    Decode(String),

    /// A paginated listing did not reach its last page within the page limit.
    #[error("task listing still incomplete after {pages} pages")]
    Truncated {
        /// Pages read before giving up.
        pages: u32,
    },

    /// A failure captured in a cassette and served during replay.
    #[error("{0}")]
    Replayed(String),
}

/// Reads and updates tasks in an external project-management service.
///
/// Every call is independent and may fail on its own; callers turn failures
/// into per-task results rather than aborting.
pub trait TaskTracker: Send + Sync {
    /// Fetches a single task by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the task cannot be fetched or decoded.
    fn fetch_task<'a>(&'a self, id: &'a str) -> TaskFuture<'a, Task>;

    /// Lists every task in the configured list whose `parent_id` equals `parent_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be fetched or decoded.
    fn list_tasks_with_parent<'a>(&'a self, parent_id: &'a str) -> TaskFuture<'a, Vec<Task>>;

    /// Moves a task to the stage with the given identifier.
    ///
    /// Calling this twice with the same stage has the same effect as once.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the update.
    fn update_task_stage<'a>(&'a self, id: &'a str, stage_id: &'a str) -> TaskFuture<'a, ()>;
}
