//! Port implementations.
//!
//! - `live`: talks to the real task service and system clock.
//! - `recording`: wraps a live adapter and writes every call to a cassette.
//! - `replaying`: answers calls from a previously recorded cassette.

pub mod live;
pub mod recording;
pub mod replaying;
