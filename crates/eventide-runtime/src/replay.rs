//! Event-file replay.
//!
//! Reads JSON-lines event files and feeds them into a stream in file order.
//! One object per line:
//!
//! ```text
//! {"timestamp": 5,  "kind": "regular", "payload": {"photo_id": 3, "user_id": 9}}
//! {"timestamp": 30, "kind": "watermark"}
//! ```
//!
//! This is test and demo tooling; the engine does not own a wire format.

use std::path::Path;

use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::debug;

use eventide_core::{EngineError, Event, EventKind, Timestamp};

use crate::stream::StreamSender;

#[derive(Deserialize)]
struct RawEvent {
    timestamp: Timestamp,
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

/// Parse one JSONL line into an event.
///
/// A kind other than `regular`/`watermark` is a protocol defect
/// ([`EngineError::UnsupportedKind`]), not something to skip over.
pub fn parse_line(line: &str) -> Result<Event, EngineError> {
    let raw: RawEvent = serde_json::from_str(line)?;
    let kind = match raw.kind.as_str() {
        "regular" => EventKind::Regular,
        "watermark" => EventKind::Watermark,
        other => return Err(EngineError::UnsupportedKind(other.to_string())),
    };
    let payload = match (&kind, &raw.payload) {
        (EventKind::Watermark, _) | (_, serde_json::Value::Null) => Vec::new(),
        (EventKind::Regular, value) => serde_json::to_vec(value)?,
    };
    Ok(Event {
        timestamp: raw.timestamp,
        kind,
        payload,
    })
}

/// Read every event from a JSONL file, in file order. Blank lines are
/// ignored; any malformed line fails the whole read.
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<Event>, EngineError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let mut events = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        events.push(parse_line(line)?);
    }
    debug!(
        path = %path.as_ref().display(),
        count = events.len(),
        "loaded event file"
    );
    Ok(events)
}

/// Feed a pre-loaded event sequence into a stream, preserving order.
pub fn spawn_replay(
    events: Vec<Event>,
    sender: StreamSender,
) -> JoinHandle<Result<(), EngineError>> {
    tokio::spawn(async move {
        for event in events {
            sender.send(event).await?;
        }
        Ok(())
    })
}
