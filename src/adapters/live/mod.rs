//! Live adapters for real external interactions.

pub mod clock;
pub mod tasks;

pub use clock::LiveClock;
pub use tasks::LiveTaskTracker;
