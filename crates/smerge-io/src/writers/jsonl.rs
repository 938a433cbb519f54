//! Streaming NDJSON writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::{Map, Value};
use smerge_core::prelude::{Row, RowBatch, Schema};
use smerge_operators::{OpError, Push, RowSink};

use crate::error::Result;
use crate::value::to_json;

pub struct JsonlWriter<W: Write> {
    writer: BufWriter<W>,
    // column names stay fixed across batches
    columns: Vec<String>,
    pending: usize,
    flush_every: usize,
}

impl JsonlWriter<File> {
    pub fn to_path(path: impl AsRef<Path>, columns: Option<Vec<String>>) -> Result<Self> {
        let f = File::create(path)?;
        Ok(Self::to_writer(f, columns))
    }
}

impl<W: Write> JsonlWriter<W> {
    pub fn to_writer(writer: W, columns: Option<Vec<String>>) -> Self {
        Self {
            writer: BufWriter::new(writer),
            columns: columns.unwrap_or_default(),
            pending: 0,
            flush_every: 4096,
        }
    }

    pub fn with_flush_every(mut self, n: usize) -> Self {
        self.flush_every = n.max(1);
        self
    }

    /// One JSON object per row.
    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        let mut obj = Map::new();
        for (name, value) in self.columns.iter().zip(row.values()) {
            obj.insert(name.clone(), to_json(value));
        }
        serde_json::to_writer(&mut self.writer, &Value::Object(obj))?;
        self.writer.write_all(b"\n")?;
        self.pending += 1;
        if self.pending >= self.flush_every {
            self.flush()?;
        }
        Ok(())
    }

    /// If no columns were given, they are taken from the first batch.
    pub fn write_batch(&mut self, batch: &RowBatch) -> Result<()> {
        if self.columns.is_empty() {
            self.columns = batch.column_names();
        }
        for row in batch.rows() {
            self.write_row(&row)?;
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.pending = 0;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::error::Error::Io(e.into_error()))
    }
}

impl<W: Write> RowSink for JsonlWriter<W> {
    fn begin(&mut self, schema: &Schema) -> std::result::Result<(), OpError> {
        if self.columns.is_empty() {
            self.columns = schema.names();
        }
        Ok(())
    }

    fn push(&mut self, row: Row) -> std::result::Result<Push, OpError> {
        self.write_row(&row)?;
        Ok(Push::Continue)
    }

    fn finish(&mut self) -> std::result::Result<(), OpError> {
        Ok(self.flush()?)
    }
}
