//! Replaying adapter for the `TaskTracker` port.

use super::{next_output, replay_result, SharedReplayer};
use crate::cassette::format::TASKS_PORT;
use crate::ports::{Task, TaskFuture, TaskTracker};

/// Serves recorded task tracker results.
///
/// Calls are matched by method and order only; arguments are not checked.
/// A call the cassette cannot answer fails like a remote error would.
pub struct ReplayingTaskTracker {
    replayer: Option<SharedReplayer>,
}

impl ReplayingTaskTracker {
    /// Creates a replaying tracker backed by the given replayer.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer: Some(replayer) }
    }

    /// Creates a replaying tracker with no cassette; every call fails.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { replayer: None }
    }
}

impl TaskTracker for ReplayingTaskTracker {
    fn fetch_task<'a>(&'a self, _id: &'a str) -> TaskFuture<'a, Task> {
        let output = next_output(self.replayer.as_ref(), TASKS_PORT, "fetch_task");
        Box::pin(async move { replay_result(output) })
    }

    fn list_tasks_with_parent<'a>(&'a self, _parent_id: &'a str) -> TaskFuture<'a, Vec<Task>> {
        let output = next_output(self.replayer.as_ref(), TASKS_PORT, "list_tasks_with_parent");
        Box::pin(async move { replay_result(output) })
    }

    fn update_task_stage<'a>(&'a self, _id: &'a str, _stage_id: &'a str) -> TaskFuture<'a, ()> {
        let output = next_output(self.replayer.as_ref(), TASKS_PORT, "update_task_stage");
        Box::pin(async move { replay_result(output) })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use crate::cassette::replayer::CassetteReplayer;
    use crate::ports::TrackerError;

    #[tokio::test]
    async fn replays_tasks_and_errors() {
        let cassette = Cassette {
            name: "t".into(),
            recorded_at: Utc::now(),
            commit: "abc".into(),
            interactions: vec![
                Interaction {
                    seq: 0,
                    port: "tasks".into(),
                    method: "fetch_task".into(),
                    input: json!({"id": "123456789"}),
                    output: json!({"Ok": {"id": "123456789", "stage": {"name": "Dev"}}}),
                },
                Interaction {
                    seq: 1,
                    port: "tasks".into(),
                    method: "update_task_stage".into(),
                    input: json!({"id": "123456789", "stage_id": "Q1"}),
                    output: json!({"Err": "task service returned 500: down"}),
                },
            ],
        };
        let replayer = Arc::new(Mutex::new(CassetteReplayer::new(&cassette)));
        let tracker = ReplayingTaskTracker::new(replayer);

        let task = tracker.fetch_task("123456789").await.unwrap();
        assert_eq!(task.stage_name(), "Dev");

        let err = tracker.update_task_stage("123456789", "Q1").await.unwrap_err();
        assert_eq!(err, TrackerError::Replayed("task service returned 500: down".into()));

        assert!(tracker.fetch_task("987654321").await.is_err());
    }

    #[tokio::test]
    async fn unconfigured_tracker_fails_every_call() {
        let tracker = ReplayingTaskTracker::unconfigured();
        assert!(tracker.list_tasks_with_parent("111111111").await.is_err());
    }
}
