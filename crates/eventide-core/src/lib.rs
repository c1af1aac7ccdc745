//! Eventide core — event model and error taxonomy
//!
//! This crate holds the types shared by every Eventide operator: the
//! immutable [`Event`] record and the [`EngineError`] taxonomy. Everything
//! else (window assignment, watermarks, operators) lives in
//! `eventide-runtime`.

pub mod error;
pub mod event;

pub use error::EngineError;
pub use event::{Event, EventKind, Timestamp};
