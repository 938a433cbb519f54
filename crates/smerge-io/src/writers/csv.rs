//! CSV writer. Emits a header row from the output schema.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use smerge_core::prelude::{Row, RowBatch, Schema};
use smerge_operators::{OpError, Push, RowSink};

use crate::error::Result;
use crate::value::format_value;

pub struct CsvWriter<W: Write> {
    wtr: csv::Writer<W>,
    header_written: bool,
    pending: usize,
    flush_every: usize,
}

impl CsvWriter<File> {
    pub fn to_path(path: impl AsRef<Path>) -> Result<Self> {
        let f = File::create(path)?;
        Ok(Self::to_writer(f))
    }
}

impl<W: Write> CsvWriter<W> {
    pub fn to_writer(w: W) -> Self {
        Self {
            wtr: csv::WriterBuilder::new().has_headers(false).from_writer(w),
            header_written: false,
            pending: 0,
            flush_every: 4096,
        }
    }

    /// Flush after every `n` rows (at least one).
    pub fn with_flush_every(mut self, n: usize) -> Self {
        self.flush_every = n.max(1);
        self
    }

    pub fn write_header(&mut self, names: &[String]) -> Result<()> {
        if !self.header_written {
            self.wtr.write_record(names)?;
            self.header_written = true;
        }
        Ok(())
    }

    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        self.wtr
            .write_record(row.values().iter().map(format_value))?;
        self.pending += 1;
        if self.pending >= self.flush_every {
            self.flush()?;
        }
        Ok(())
    }

    pub fn write_batch(&mut self, batch: &RowBatch) -> Result<()> {
        self.write_header(&batch.column_names())?;
        for row in batch.rows() {
            self.write_row(&row)?;
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.wtr.flush()?;
        self.pending = 0;
        Ok(())
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.wtr
            .into_inner()
            .map_err(|e| crate::error::Error::Io(e.into_error()))
    }
}

impl<W: Write> RowSink for CsvWriter<W> {
    fn begin(&mut self, schema: &Schema) -> std::result::Result<(), OpError> {
        Ok(self.write_header(&schema.names())?)
    }

    fn push(&mut self, row: Row) -> std::result::Result<Push, OpError> {
        self.write_row(&row)?;
        Ok(Push::Continue)
    }

    fn finish(&mut self) -> std::result::Result<(), OpError> {
        Ok(self.flush()?)
    }
}
