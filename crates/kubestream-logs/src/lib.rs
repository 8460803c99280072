//! Log processing for kubestream
//!
//! This crate provides timestamp normalization, line parsing, session
//! management for live tails, and the buffered sink the UI draws from.

mod buffer;
mod consumer;
pub mod export;
mod lines;
mod parser;
mod search;
mod session;
mod sink;
pub mod timestamp;

pub use buffer::{DEFAULT_CAPACITY, LevelCounts, LogBuffer};
pub use consumer::StreamConsumer;
pub use lines::LineSplitter;
pub use parser::{LogParser, record_id};
pub use search::SearchQuery;
pub use session::{SessionError, SessionEvents, SessionManager, SessionRequest};
pub use sink::{LogSink, SearchHit};

// Re-export types used in our public API
pub use kubestream_types::{
    ExportFormat, LogLevel, LogRecord, RecordKind, SessionId, SessionKey, StreamEvent, Timestamp,
};
