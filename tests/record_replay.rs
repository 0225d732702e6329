//! Record-replay round-trip integration tests.
//!
//! A run recorded through the recording adapters, or a cassette written by
//! hand, must replay into the same run summary every time.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::json;

use stagesync::adapters::recording::{RecordingClock, RecordingTaskTracker};
use stagesync::cassette::config::CassetteConfig;
use stagesync::cassette::recorder::CassetteRecorder;
use stagesync::cassette::session::RecordingSession;
use stagesync::config::{RunInputs, SyncConfig};
use stagesync::context::ServiceContext;
use stagesync::ports::{Clock, Stage, Task, TaskFuture, TaskTracker, TrackerError};
use stagesync::reconcile::{ParentOutcome, Reconciler, RunOutcome, RunSummary};

const CONFIG: &str = r"
projectId: '9001'
listId: '9002'
apiBaseUrl: https://tasks.example.com/v2
branches:
  development: { targetStage: QA, targetStageId: Q1 }
  main: { targetStage: Done, targetStageId: D1 }
stageHierarchy: { Dev: 2, QA: 4, Done: 6 }
parentRules:
  - parentStage: Dev
    actions:
      - { condition: all, subtaskStage: QA, moveParentTo: Done }
";

fn config() -> SyncConfig {
    SyncConfig::from_yaml(CONFIG, Path::new("replay.yaml")).unwrap()
}

fn inputs() -> RunInputs {
    RunInputs::new(
        Some("pk_token".into()),
        Some("development".into()),
        Some("## Tasks\n- #123456789\n- #987654321".into()),
        "replay-run".into(),
    )
    .unwrap()
}

fn task(id: &str, stage: &str, parent: Option<&str>) -> Task {
    Task {
        id: id.into(),
        stage: Some(Stage { name: Some(stage.into()) }),
        parent_id: parent.map(String::from),
    }
}

fn summary(outcome: RunOutcome) -> RunSummary {
    match outcome {
        RunOutcome::Completed(summary) => summary,
        other => panic!("expected a completed run, got {other:?}"),
    }
}

async fn reconcile(ctx: &ServiceContext) -> RunSummary {
    summary(Reconciler::new(ctx, &config()).run(&inputs()).await)
}

/// Fixed-answer service standing in for the live one while recording.
struct ScriptedTracker;

impl TaskTracker for ScriptedTracker {
    fn fetch_task<'a>(&'a self, id: &'a str) -> TaskFuture<'a, Task> {
        let found = match id {
            "111111111" => task(id, "Dev", None),
            _ => task(id, "Dev", Some("111111111")),
        };
        Box::pin(async move { Ok::<_, TrackerError>(found) })
    }

    fn list_tasks_with_parent<'a>(&'a self, parent_id: &'a str) -> TaskFuture<'a, Vec<Task>> {
        let subtasks = vec![
            task("123456789", "QA", Some(parent_id)),
            task("987654321", "QA", Some(parent_id)),
        ];
        Box::pin(async move { Ok::<_, TrackerError>(subtasks) })
    }

    fn update_task_stage<'a>(&'a self, _id: &'a str, _stage_id: &'a str) -> TaskFuture<'a, ()> {
        Box::pin(async { Ok::<_, TrackerError>(()) })
    }
}

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-15T14:30:00Z").unwrap().with_timezone(&Utc)
    }
}

#[tokio::test]
async fn recorded_session_replays_into_the_same_summary() {
    let root = std::env::temp_dir().join("stagesync_record_session_test");
    let _ = std::fs::remove_dir_all(&root);

    let session = RecordingSession::new(&root).unwrap();
    let ctx = ServiceContext::new(
        Box::new(RecordingTaskTracker::new(Box::new(ScriptedTracker), Arc::clone(&session.tasks))),
        Box::new(RecordingClock::new(Box::new(FixedClock), Arc::clone(&session.clock))),
    );
    let recorded = reconcile(&ctx).await;
    drop(ctx);
    let dir = session.finish().unwrap();

    assert_eq!(recorded.parents_updated(), 1);

    let first = ServiceContext::replaying_from(&CassetteConfig::from_session_dir(&dir)).unwrap();
    let second = ServiceContext::replaying_from(&CassetteConfig::from_session_dir(&dir)).unwrap();
    assert_eq!(reconcile(&first).await, recorded);
    assert_eq!(reconcile(&second).await, recorded);

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn hand_written_cassette_replays_deterministically() {
    let dir = std::env::temp_dir().join("stagesync_record_replay_test");
    std::fs::create_dir_all(&dir).unwrap();
    let cassette_path = dir.join("roundtrip.cassette.yaml");

    let mut recorder = CassetteRecorder::new(&cassette_path, "roundtrip-test", "abc123");
    recorder.record("clock", "now", json!(null), json!("2025-03-15T14:30:00Z"));
    recorder.record(
        "tasks",
        "fetch_task",
        json!({"id": "123456789"}),
        json!({"Ok": {"id": "123456789", "stage": {"name": "Dev"}, "parent_id": "111111111"}}),
    );
    recorder.record(
        "tasks",
        "update_task_stage",
        json!({"id": "123456789", "stage_id": "Q1"}),
        json!({"Ok": null}),
    );
    recorder.record(
        "tasks",
        "fetch_task",
        json!({"id": "987654321"}),
        json!({"Err": "task service returned 404: Task not found"}),
    );
    recorder.record(
        "tasks",
        "fetch_task",
        json!({"id": "111111111"}),
        json!({"Ok": {"id": "111111111", "stage": {"name": "Dev"}}}),
    );
    recorder.record(
        "tasks",
        "list_tasks_with_parent",
        json!({"parent_id": "111111111"}),
        json!({"Ok": [
            {"id": "123456789", "stage": {"name": "QA"}, "parent_id": "111111111"},
            {"id": "555555555", "stage": {"name": "Dev"}, "parent_id": "111111111"}
        ]}),
    );
    recorder.record("clock", "now", json!(null), json!("2025-03-15T14:30:02Z"));
    let written = recorder.finish().expect("recording should succeed");
    assert_eq!(written, cassette_path);

    let first = reconcile(&ServiceContext::replaying(&cassette_path).unwrap()).await;
    assert_eq!(first.tasks_succeeded(), 1);
    assert_eq!(first.tasks_failed(), 1);
    let report = first.to_string();
    assert!(report.contains("#987654321 FAILED: fetch failed: task service returned 404"));
    assert_eq!(first.parents[0].outcome, ParentOutcome::NoChange { stage: "Dev".into() });
    assert_eq!((first.finished_at - first.started_at).num_seconds(), 2);

    let second = reconcile(&ServiceContext::replaying(&cassette_path).unwrap()).await;
    assert_eq!(first, second, "replays of one cassette must agree");

    let _ = std::fs::remove_dir_all(&dir);
}
