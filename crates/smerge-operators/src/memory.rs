//! In-memory sources and sinks.
//!
//! Used by the batch operator surface and by hosts that already hold their
//! inputs in memory. Sources can be told how to end (EOF, failure, or
//! cancellation) so the driver's exit paths are easy to exercise.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use smerge_core::prelude::{Row, RowBatch, Schema};

use crate::traits::{OpError, Push, RowSink, RowSource};

#[derive(Debug, Clone)]
enum Tail {
    Eof,
    Fail(String),
    Cancel,
}

pub struct MemorySource {
    schema: Schema,
    rows: VecDeque<Row>,
    tail: Tail,
    closed: Arc<AtomicBool>,
}

impl MemorySource {
    pub fn new(schema: Schema, rows: Vec<Row>) -> Self {
        Self {
            schema,
            rows: rows.into(),
            tail: Tail::Eof,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_batch(schema: Schema, batch: &RowBatch) -> Self {
        Self::new(schema, batch.rows())
    }

    /// Yields `rows`, then fails with `message` instead of ending.
    pub fn failing(schema: Schema, rows: Vec<Row>, message: impl Into<String>) -> Self {
        Self {
            tail: Tail::Fail(message.into()),
            ..Self::new(schema, rows)
        }
    }

    /// Yields `rows`, then reports cancellation instead of ending.
    pub fn canceling(schema: Schema, rows: Vec<Row>) -> Self {
        Self {
            tail: Tail::Cancel,
            ..Self::new(schema, rows)
        }
    }

    /// Flag that flips once the owning cursor closes this source.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

impl RowSource for MemorySource {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn pull(&mut self) -> Result<Option<Row>, OpError> {
        if let Some(row) = self.rows.pop_front() {
            return Ok(Some(row));
        }
        match &self.tail {
            Tail::Eof => Ok(None),
            Tail::Fail(msg) => Err(OpError::Exec(msg.clone())),
            Tail::Cancel => Err(OpError::Canceled),
        }
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Sink that collects every row it is given.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub schema: Option<Schema>,
    pub rows: Vec<Row>,
    pub finished: bool,
    stop_after: Option<usize>,
    fail_after: Option<usize>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse further rows (clean stop) once `n` rows were accepted.
    pub fn stop_after(n: usize) -> Self {
        Self {
            stop_after: Some(n),
            ..Self::default()
        }
    }

    /// Fail on the push that would exceed `n` accepted rows.
    pub fn fail_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }

    pub fn into_batch(self) -> RowBatch {
        let names = self.schema.map(|s| s.names()).unwrap_or_default();
        RowBatch::from_rows(&names, &self.rows)
    }
}

impl RowSink for CollectSink {
    fn begin(&mut self, schema: &Schema) -> Result<(), OpError> {
        self.schema = Some(schema.clone());
        Ok(())
    }

    fn push(&mut self, row: Row) -> Result<Push, OpError> {
        if self.fail_after.is_some_and(|n| self.rows.len() >= n) {
            return Err(OpError::Exec("sink full".into()));
        }
        self.rows.push(row);
        if self.stop_after.is_some_and(|n| self.rows.len() >= n) {
            return Ok(Push::Stop);
        }
        Ok(Push::Continue)
    }

    fn finish(&mut self) -> Result<(), OpError> {
        self.finished = true;
        Ok(())
    }
}
