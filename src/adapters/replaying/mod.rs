//! Replaying adapters that answer port calls from a cassette.

pub mod clock;
pub mod tasks;

use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;

use crate::cassette::replayer::{CassetteReplayer, ReplayError};
use crate::ports::TrackerError;

pub use clock::ReplayingClock;
pub use tasks::ReplayingTaskTracker;

/// Shared handle to a replayer; several adapters may read one cassette.
pub type SharedReplayer = Arc<Mutex<CassetteReplayer>>;

/// Takes the recorded output of the next `port`/`method` call.
pub(crate) fn next_output(
    replayer: Option<&SharedReplayer>,
    port: &str,
    method: &str,
) -> Result<serde_json::Value, ReplayError> {
    let Some(replayer) = replayer else {
        return Err(ReplayError::NotRecorded {
            port: port.to_string(),
            method: method.to_string(),
            available: String::new(),
        });
    };
    let mut guard = replayer.lock().unwrap_or_else(PoisonError::into_inner);
    guard.next_interaction(port, method).map(|i| i.output.clone())
}

/// Decodes an `{"Ok": value}` / `{"Err": message}` output written by the recorder.
pub(crate) fn replay_result<T: DeserializeOwned>(
    output: Result<serde_json::Value, ReplayError>,
) -> Result<T, TrackerError> {
    let mut output = output.map_err(|e| TrackerError::Replayed(e.to_string()))?;
    if let Some(message) = output.get("Err") {
        let message = message.as_str().map_or_else(|| message.to_string(), String::from);
        return Err(TrackerError::Replayed(message));
    }
    match output.get_mut("Ok") {
        Some(value) => serde_json::from_value(value.take())
            .map_err(|e| TrackerError::Replayed(format!("malformed recorded value: {e}"))),
        None => Err(TrackerError::Replayed(format!("recorded output is not a result: {output}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_output_is_decoded() {
        let value: Result<Vec<u32>, _> = replay_result(Ok(json!({"Ok": [1, 2]})));
        assert_eq!(value.unwrap(), vec![1, 2]);
    }

    #[test]
    fn unit_ok_output_is_decoded() {
        let value: Result<(), _> = replay_result(Ok(json!({"Ok": null})));
        assert!(value.is_ok());
    }

    #[test]
    fn err_output_keeps_message() {
        let message = "task service returned 404: gone";
        let value: Result<(), _> = replay_result(Ok(json!({ "Err": message })));
        assert_eq!(value.unwrap_err(), TrackerError::Replayed(message.into()));
    }

    #[test]
    fn missing_replayer_is_an_error() {
        let output = next_output(None, "tasks", "fetch_task");
        assert!(matches!(output, Err(ReplayError::NotRecorded { .. })));
    }
}
