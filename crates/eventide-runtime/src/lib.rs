//! Eventide runtime — windowed stream operators
//!
//! This crate implements the computational core of the Eventide pipeline:
//! sliding-window assignment, per-source watermark tracking, window buffers,
//! and the aggregate / join / filter operators that combine them. Query
//! semantics (what to aggregate, when two events match) are supplied as
//! pluggable functions; see [`functions`] and the [`social`] demo query.

pub mod aggregate;
pub mod assigner;
pub mod buffer;
pub mod filter;
pub mod functions;
pub mod join;
pub mod metrics;
pub mod replay;
pub mod sink;
pub mod social;
pub mod stream;
pub mod watermark;

pub use aggregate::WindowAggregateOperator;
pub use assigner::{WindowId, WindowSpec};
pub use buffer::WindowBuffer;
pub use eventide_core::{EngineError, Event, EventKind, Timestamp};
pub use filter::FilterOperator;
pub use functions::{AggregateFn, FilterFn, JoinFn};
pub use join::{JoinSide, WindowJoinOperator};
pub use metrics::Metrics;
pub use replay::{read_events, spawn_replay};
pub use sink::{spawn_sink, ConsoleSink, FileSink, MultiSink, Sink};
pub use stream::{channel, Stream, StreamSender};
pub use watermark::WatermarkTracker;
