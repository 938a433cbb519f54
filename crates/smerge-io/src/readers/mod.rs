//! Streaming readers that yield typed rows.

pub mod csv;
