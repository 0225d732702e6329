//! Recording adapter for the `TaskTracker` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::format::TASKS_PORT;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{Task, TaskFuture, TaskTracker};

/// Records task tracker calls while delegating to an inner tracker.
pub struct RecordingTaskTracker {
    inner: Box<dyn TaskTracker>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingTaskTracker {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(inner: Box<dyn TaskTracker>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct FetchTaskInput<'a> {
    id: &'a str,
}

#[derive(Serialize)]
struct ListTasksInput<'a> {
    parent_id: &'a str,
}

#[derive(Serialize)]
struct UpdateStageInput<'a> {
    id: &'a str,
    stage_id: &'a str,
}

impl TaskTracker for RecordingTaskTracker {
    fn fetch_task<'a>(&'a self, id: &'a str) -> TaskFuture<'a, Task> {
        Box::pin(async move {
            let result = self.inner.fetch_task(id).await;
            let input = FetchTaskInput { id };
            record_result(&self.recorder, TASKS_PORT, "fetch_task", &input, &result);
            result
        })
    }

    fn list_tasks_with_parent<'a>(&'a self, parent_id: &'a str) -> TaskFuture<'a, Vec<Task>> {
        Box::pin(async move {
            let result = self.inner.list_tasks_with_parent(parent_id).await;
            let input = ListTasksInput { parent_id };
            record_result(&self.recorder, TASKS_PORT, "list_tasks_with_parent", &input, &result);
            result
        })
    }

    fn update_task_stage<'a>(&'a self, id: &'a str, stage_id: &'a str) -> TaskFuture<'a, ()> {
        Box::pin(async move {
            let result = self.inner.update_task_stage(id, stage_id).await;
            let input = UpdateStageInput { id, stage_id };
            record_result(&self.recorder, TASKS_PORT, "update_task_stage", &input, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::Cassette;
    use crate::ports::TrackerError;

    struct FixedTracker;

    impl TaskTracker for FixedTracker {
        fn fetch_task<'a>(&'a self, id: &'a str) -> TaskFuture<'a, Task> {
            Box::pin(async move { Ok(Task { id: id.to_string(), stage: None, parent_id: None }) })
        }

        fn list_tasks_with_parent<'a>(&'a self, _parent_id: &'a str) -> TaskFuture<'a, Vec<Task>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn update_task_stage<'a>(&'a self, _id: &'a str, _stage_id: &'a str) -> TaskFuture<'a, ()> {
            Box::pin(async { Err(TrackerError::Status { status: 403, message: "denied".into() }) })
        }
    }

    #[tokio::test]
    async fn records_successes_and_failures() {
        let dir = std::env::temp_dir().join("stagesync_rec_tasks_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tasks.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "test", "abc")));

        {
            let tracker = RecordingTaskTracker::new(Box::new(FixedTracker), Arc::clone(&recorder));
            assert!(tracker.fetch_task("123456789").await.is_ok());
            assert!(tracker.update_task_stage("123456789", "Q1").await.is_err());
        }

        let recorder = Arc::try_unwrap(recorder).unwrap().into_inner().unwrap();
        recorder.finish().unwrap();

        let cassette = Cassette::from_yaml(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(cassette.interactions[0].method, "fetch_task");
        assert_eq!(cassette.interactions[0].output["Ok"]["id"], "123456789");
        assert_eq!(cassette.interactions[1].input["stage_id"], "Q1");
        assert_eq!(cassette.interactions[1].output["Err"], "task service returned 403: denied");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
