//! Clock port used to stamp run summaries.

use chrono::{DateTime, Utc};

/// Provides the current time.
///
/// Swapped for a recorded clock during cassette playback so that summary
/// timestamps are reproducible.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}
