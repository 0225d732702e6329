//! Service context bundling the port trait objects a sync run uses.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::adapters::live::{LiveClock, LiveTaskTracker};
use crate::adapters::recording::{RecordingClock, RecordingTaskTracker};
use crate::adapters::replaying::{ReplayingClock, ReplayingTaskTracker};
use crate::cassette::config::CassetteConfig;
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::config::SyncConfig;
use crate::ports::clock::Clock;
use crate::ports::tasks::TaskTracker;

/// Bundles every external boundary of a run.
///
/// Constructors wire up live, recording or replaying adapters; tests can
/// supply their own through [`ServiceContext::new`].
pub struct ServiceContext {
    /// Remote task service.
    pub tasks: Box<dyn TaskTracker>,
    /// Clock used to stamp the run summary.
    pub clock: Box<dyn Clock>,
}

impl ServiceContext {
    /// Creates a context from explicit adapters.
    #[must_use]
    pub fn new(tasks: Box<dyn TaskTracker>, clock: Box<dyn Clock>) -> Self {
        Self { tasks, clock }
    }

    /// Creates a live context talking to the service configured in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn live(config: &SyncConfig, token: &str) -> Result<Self, String> {
        let tasks = LiveTaskTracker::new(config, token)
            .map_err(|e| format!("Failed to create task service client: {e}"))?;
        Ok(Self::new(Box::new(tasks), Box::new(LiveClock)))
    }

    /// Creates a live context whose calls are recorded into a new session under `root`.
    ///
    /// The returned session must be finished after the context is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the session directory or HTTP client cannot be created.
    pub fn recording_at(
        root: &Path,
        config: &SyncConfig,
        token: &str,
    ) -> Result<(Self, RecordingSession), String> {
        let session = RecordingSession::new(root)?;
        let live = Self::live(config, token)?;
        let ctx = Self::new(
            Box::new(RecordingTaskTracker::new(live.tasks, Arc::clone(&session.tasks))),
            Box::new(RecordingClock::new(live.clock, Arc::clone(&session.clock))),
        );
        Ok((ctx, session))
    }

    /// Creates a replaying context from a single cassette holding every port.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        let cassette = Cassette::from_yaml(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))?;

        let replayer = Arc::new(Mutex::new(CassetteReplayer::new(&cassette)));
        Ok(Self::new(
            Box::new(ReplayingTaskTracker::new(Arc::clone(&replayer))),
            Box::new(ReplayingClock::new(replayer)),
        ))
    }

    /// Creates a replaying context from per-port cassettes.
    ///
    /// A port without a cassette still answers: the tracker fails every call
    /// and the clock reads the Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured cassette cannot be read or parsed.
    pub fn replaying_from(config: &CassetteConfig) -> Result<Self, String> {
        let replayers = config.load_all()?;
        let tasks: Box<dyn TaskTracker> = match replayers.tasks {
            Some(r) => Box::new(ReplayingTaskTracker::new(Arc::new(Mutex::new(r)))),
            None => Box::new(ReplayingTaskTracker::unconfigured()),
        };
        let clock: Box<dyn Clock> = match replayers.clock {
            Some(r) => Box::new(ReplayingClock::new(Arc::new(Mutex::new(r)))),
            None => Box::new(ReplayingClock::unconfigured()),
        };
        Ok(Self::new(tasks, clock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::recorder::CassetteRecorder;
    use serde_json::json;

    #[tokio::test]
    async fn replaying_context_serves_both_ports_from_one_cassette() {
        let dir = std::env::temp_dir().join("stagesync_ctx_mono");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("run.cassette.yaml");

        let mut recorder = CassetteRecorder::new(&path, "ctx", "abc");
        recorder.record("clock", "now", json!(null), json!("2025-03-15T14:30:00Z"));
        recorder.record(
            "tasks",
            "fetch_task",
            json!({"id": "123456789"}),
            json!({"Ok": {"id": "123456789", "stage": {"name": "QA"}}}),
        );
        recorder.finish().unwrap();

        let ctx = ServiceContext::replaying(&path).unwrap();
        assert_eq!(ctx.clock.now().to_rfc3339(), "2025-03-15T14:30:00+00:00");
        assert_eq!(ctx.tasks.fetch_task("123456789").await.unwrap().stage_name(), "QA");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn unconfigured_ports_fail_softly() {
        let ctx = ServiceContext::replaying_from(&CassetteConfig::default()).unwrap();
        assert!(ctx.tasks.fetch_task("123456789").await.is_err());
        assert_eq!(ctx.clock.now(), chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);
    }
}
