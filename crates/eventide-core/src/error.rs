//! Error taxonomy for the Eventide engine.
//!
//! Every failure an operator can surface is one of these variants. None of
//! them is retried internally; retry, if any, belongs to the dispatch layer
//! feeding the operator.

use thiserror::Error;

use crate::event::Timestamp;

/// Errors surfaced by Eventide operators and their collaborators.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A Regular event arrived with a timestamp at or below the source's
    /// current watermark. The upstream source broke its ordering contract;
    /// processing of the offending event is aborted.
    #[error(
        "ordering violation on source {source_id}: regular event at {timestamp} \
         does not exceed watermark {watermark}"
    )]
    OrderingViolation {
        source_id: usize,
        timestamp: Timestamp,
        watermark: Timestamp,
    },

    /// An event kind outside {regular, watermark} was encountered at a
    /// decode boundary. Protocol defect, not retriable.
    #[error("unsupported event kind `{0}`")]
    UnsupportedKind(String),

    /// Window length is not a positive exact multiple of the slide.
    /// Rejected at operator construction, before any event is processed.
    #[error("invalid window configuration: slide={slide}, length={length}")]
    InvalidWindow { slide: i64, length: i64 },

    /// The opaque payload could not be encoded or decoded.
    #[error("payload codec error: {0}")]
    Payload(#[from] serde_json::Error),

    /// An event file could not be read.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A query-supplied aggregate, join, or filter function failed. The
    /// failure is propagated for the whole window or pair; nothing is
    /// partially emitted.
    #[error("user function failed: {0}")]
    Function(anyhow::Error),

    /// The downstream output channel is gone.
    #[error("downstream output closed")]
    OutputClosed,
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::Function(err)
    }
}
