//! Event types for the engine.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Event time in milliseconds. The engine never consults a wall clock;
/// every temporal decision is driven by these timestamps and watermarks.
pub type Timestamp = i64;

/// Kind of an event on a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A data-carrying event.
    Regular,
    /// A progress signal: no Regular event with a timestamp at or below
    /// this one will arrive on the same source afterwards.
    Watermark,
}

/// An immutable stream record.
///
/// The payload is opaque to the engine; only the query-supplied aggregate,
/// join, and filter functions interpret it. [`Event::encode`] and
/// [`Event::decode`] are the codec those functions use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: Timestamp,
    pub kind: EventKind,
    #[serde(default)]
    pub payload: Vec<u8>,
}

impl Event {
    /// Create a Regular event carrying raw payload bytes.
    pub fn regular(timestamp: Timestamp, payload: Vec<u8>) -> Self {
        Self {
            timestamp,
            kind: EventKind::Regular,
            payload,
        }
    }

    /// Create a Watermark event. Watermarks carry no payload.
    pub fn watermark(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            kind: EventKind::Watermark,
            payload: Vec::new(),
        }
    }

    /// Create a Regular event whose payload is the JSON encoding of `value`.
    pub fn encode<T: Serialize>(timestamp: Timestamp, value: &T) -> Result<Self, EngineError> {
        Ok(Self::regular(timestamp, serde_json::to_vec(value)?))
    }

    /// Decode the payload into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, EngineError> {
        Ok(serde_json::from_slice(&self.payload)?)
    }

    pub fn is_regular(&self) -> bool {
        self.kind == EventKind::Regular
    }

    pub fn is_watermark(&self) -> bool {
        self.kind == EventKind::Watermark
    }
}
