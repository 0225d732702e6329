//! Recording adapters that capture interactions to cassettes.

pub mod clock;
pub mod tasks;

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::cassette::recorder::CassetteRecorder;

pub use clock::RecordingClock;
pub use tasks::RecordingTaskTracker;

/// Records a call with an infallible return value.
pub(crate) fn record_interaction<I, O>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    output: &O,
) where
    I: Serialize,
    O: Serialize,
{
    let input = serde_json::to_value(input).unwrap_or_default();
    let output = serde_json::to_value(output).unwrap_or_default();
    recorder.lock().unwrap_or_else(PoisonError::into_inner).record(port, method, input, output);
}

/// Records a fallible call as `{"Ok": value}` or `{"Err": message}`.
pub(crate) fn record_result<I, T, E>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    I: Serialize,
    T: Serialize,
    E: std::fmt::Display,
{
    let output = match result {
        Ok(v) => serde_json::json!({ "Ok": serde_json::to_value(v).unwrap_or_default() }),
        Err(e) => serde_json::json!({ "Err": e.to_string() }),
    };
    let input = serde_json::to_value(input).unwrap_or_default();
    recorder.lock().unwrap_or_else(PoisonError::into_inner).record(port, method, input, output);
}
