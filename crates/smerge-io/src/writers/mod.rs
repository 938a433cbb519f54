//! Streaming writers. Both implement `RowSink`.

pub mod csv;
pub mod jsonl;
