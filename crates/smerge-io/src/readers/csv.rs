//! CSV reader that types every cell against a declared schema.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use smerge_core::prelude::{Row, RowBatch, Schema};
use smerge_operators::{OpError, RowSource};

use crate::error::{Error, Result};
use crate::value::parse_value;

pub struct CsvReader<R: Read> {
    rdr: csv::Reader<R>,
    schema: Schema,
    /// CSV column position for each schema field.
    positions: Vec<usize>,
    record: StringRecord,
}

impl CsvReader<File> {
    pub fn from_path(path: impl AsRef<Path>, schema: Schema, has_headers: bool) -> Result<Self> {
        let f = File::open(path)?;
        Self::from_reader(f, schema, has_headers)
    }
}

impl<R: Read> CsvReader<R> {
    /// With headers, schema fields are matched to columns by name and extra
    /// columns are ignored. Without headers, columns are positional.
    pub fn from_reader(r: R, schema: Schema, has_headers: bool) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(has_headers)
            .flexible(false)
            .from_reader(r);

        let positions = if has_headers {
            let headers = rdr.headers()?.clone();
            schema
                .fields
                .iter()
                .map(|f| {
                    headers
                        .iter()
                        .position(|h| h.trim() == f.name)
                        .ok_or_else(|| Error::Schema(format!("no CSV column named '{}'", f.name)))
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            (0..schema.len()).collect()
        };

        Ok(Self {
            rdr,
            schema,
            positions,
            record: StringRecord::new(),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Read and type the next record.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        if !self.rdr.read_record(&mut self.record)? {
            return Ok(None);
        }
        let line = self.record.position().map(|p| p.line()).unwrap_or(0);
        let mut values = Vec::with_capacity(self.positions.len());
        for (field, &pos) in self.schema.fields.iter().zip(&self.positions) {
            let text = self.record.get(pos).unwrap_or("");
            let value = parse_value(text, field.data_type, field.nullable).ok_or_else(|| {
                Error::Parse {
                    line,
                    column: field.name.clone(),
                    value: text.to_string(),
                    ty: field.data_type,
                }
            })?;
            values.push(value);
        }
        Ok(Some(Row::new(values)))
    }

    /// Read up to `limit` rows.
    pub fn next_batch(&mut self, limit: usize) -> Result<Option<RowBatch>> {
        let names = self.schema.names();
        let mut batch = RowBatch::empty(&names);
        while batch.num_rows() < limit {
            match self.next_row()? {
                Some(row) => batch.push_row(&row),
                None => break,
            }
        }
        if batch.num_rows() == 0 {
            return Ok(None);
        }
        Ok(Some(batch))
    }
}

/// A CSV file as one merge upstream.
pub struct CsvSource<R: Read + Send = File> {
    name: String,
    reader: Option<CsvReader<R>>,
    schema: Schema,
}

impl CsvSource<File> {
    pub fn open(path: impl AsRef<Path>, schema: Schema) -> Result<Self> {
        let name = path.as_ref().display().to_string();
        let reader = CsvReader::from_path(path, schema.clone(), true)?;
        Ok(Self {
            name,
            reader: Some(reader),
            schema,
        })
    }
}

impl<R: Read + Send> CsvSource<R> {
    pub fn from_reader(name: impl Into<String>, reader: CsvReader<R>) -> Self {
        Self {
            name: name.into(),
            schema: reader.schema().clone(),
            reader: Some(reader),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<R: Read + Send> RowSource for CsvSource<R> {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn pull(&mut self) -> std::result::Result<Option<Row>, OpError> {
        match self.reader.as_mut() {
            Some(reader) => reader
                .next_row()
                .map_err(|e| OpError::Exec(format!("{}: {e}", self.name))),
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        if self.reader.take().is_some() {
            tracing::trace!(source = %self.name, "csv source closed");
        }
    }
}
