//! Per-port cassette selection for replay.

use std::path::{Path, PathBuf};

use super::format::Cassette;
use super::replayer::CassetteReplayer;

/// Cassette file for each port. A port left as `None` is not replayed and
/// fails on first use.
#[derive(Debug, Clone, Default)]
pub struct CassetteConfig {
    /// Cassette for the task tracker port.
    pub tasks: Option<PathBuf>,
    /// Cassette for the clock port.
    pub clock: Option<PathBuf>,
}

/// Replayers built from a [`CassetteConfig`].
#[derive(Debug)]
pub struct PortReplayers {
    /// Replayer for the task tracker port.
    pub tasks: Option<CassetteReplayer>,
    /// Replayer for the clock port.
    pub clock: Option<CassetteReplayer>,
}

impl CassetteConfig {
    /// Uses the cassettes a [`RecordingSession`](super::session::RecordingSession) wrote to `dir`.
    #[must_use]
    pub fn from_session_dir(dir: &Path) -> Self {
        Self {
            tasks: Some(dir.join("tasks.cassette.yaml")),
            clock: Some(dir.join("clock.cassette.yaml")),
        }
    }

    /// Loads a cassette file and wraps it in a replayer.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<CassetteReplayer, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        let cassette = Cassette::from_yaml(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))?;
        Ok(CassetteReplayer::new(&cassette))
    }

    /// Loads every configured cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette cannot be read or parsed.
    pub fn load_all(&self) -> Result<PortReplayers, String> {
        Ok(PortReplayers {
            tasks: self.tasks.as_deref().map(Self::load).transpose()?,
            clock: self.clock.as_deref().map(Self::load).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::recorder::CassetteRecorder;
    use serde_json::json;

    #[test]
    fn loads_only_configured_ports() {
        let dir = std::env::temp_dir().join("stagesync_cassette_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tasks.cassette.yaml");

        let mut recorder = CassetteRecorder::new(&path, "tasks", "abc");
        recorder.record("tasks", "fetch_task", json!({"id": "1"}), json!({"Ok": {"id": "1"}}));
        recorder.finish().unwrap();

        let config = CassetteConfig { tasks: Some(path), ..CassetteConfig::default() };
        let mut replayers = config.load_all().unwrap();
        assert!(replayers.clock.is_none());
        let tasks = replayers.tasks.as_mut().unwrap();
        let first = tasks.next_interaction("tasks", "fetch_task").unwrap();
        assert_eq!(first.input, json!({"id": "1"}));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_cassette_file_is_reported() {
        let config = CassetteConfig::from_session_dir(Path::new("/nonexistent/stagesync"));
        let err = config.load_all().unwrap_err();
        assert!(err.contains("Failed to read cassette file"));
    }
}
