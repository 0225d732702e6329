//! Replaying adapter for the `Clock` port.

use chrono::{DateTime, Utc};

use super::{next_output, SharedReplayer};
use crate::cassette::format::CLOCK_PORT;
use crate::ports::clock::Clock;

/// Serves recorded clock readings.
///
/// Once the cassette runs out (or when none was configured) the last served
/// reading is repeated, falling back to the Unix epoch, so summaries stay
/// deterministic.
pub struct ReplayingClock {
    replayer: Option<SharedReplayer>,
    last: std::sync::Mutex<Option<DateTime<Utc>>>,
}

impl ReplayingClock {
    /// Creates a replaying clock backed by the given replayer.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer: Some(replayer), last: std::sync::Mutex::new(None) }
    }

    /// Creates a replaying clock with no cassette.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { replayer: None, last: std::sync::Mutex::new(None) }
    }
}

impl Clock for ReplayingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let replayed = next_output(self.replayer.as_ref(), CLOCK_PORT, "now")
            .ok()
            .and_then(|v| serde_json::from_value::<DateTime<Utc>>(v).ok());
        if let Some(at) = replayed {
            *last = Some(at);
        }
        last.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}
