//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the reconciliation core and an
//! external system (the task service, the wall clock). Implementations live
//! in `src/adapters/`.

pub mod clock;
pub mod tasks;

pub use clock::Clock;
pub use tasks::{Stage, Task, TaskFuture, TaskTracker, TrackerError, UNKNOWN_STAGE};
