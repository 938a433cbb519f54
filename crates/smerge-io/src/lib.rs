#![forbid(unsafe_code)]
//! smerge-io: file-backed upstreams and downstreams for the merge driver.
//!
//! Readers parse text against a declared schema, so key columns arrive
//! typed and the comparator never sees raw strings for numeric keys.
//! Writers buffer `batch_size` rows before flushing.

pub mod error;
pub mod readers;
pub mod value;
pub mod writers;

pub use error::{Error, Result};
pub use readers::csv::{CsvReader, CsvSource};
pub use writers::csv::CsvWriter;
pub use writers::jsonl::JsonlWriter;
