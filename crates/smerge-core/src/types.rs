//! Lightweight logical values, rows, and columns.
//!
//! The merge driver moves `Row`s one at a time; `RowBatch` is the columnar
//! container used by the batch operator surface and the file sinks.

use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::DataType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Decimal(BigDecimal),
    Str(String),
    Bin(Vec<u8>),
    Timestamp(DateTime<Utc>),
}

impl Scalar {
    /// Data type of a non-null value; `None` for `Null`.
    pub fn data_type(&self) -> Option<DataType> {
        Some(match self {
            Scalar::Null => return None,
            Scalar::Bool(_) => DataType::Boolean,
            Scalar::I32(_) => DataType::Int32,
            Scalar::I64(_) => DataType::Int64,
            Scalar::F32(_) => DataType::Float32,
            Scalar::F64(_) => DataType::Float64,
            Scalar::Decimal(_) => DataType::Decimal,
            Scalar::Str(_) => DataType::Utf8,
            Scalar::Bin(_) => DataType::Binary,
            Scalar::Timestamp(_) => DataType::Timestamp,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Scalar::*;
        match self {
            Null => f.write_str("null"),
            Bool(b) => write!(f, "{b}"),
            I32(i) => write!(f, "{i}"),
            I64(i) => write!(f, "{i}"),
            F32(x) => write!(f, "{x}"),
            F64(x) => write!(f, "{x}"),
            Decimal(d) => write!(f, "{d}"),
            Str(s) => f.write_str(s),
            Bin(b) => {
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

/// One immutable record. Values are positional against the producing schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Vec<Scalar>);

impl Row {
    pub fn new(values: Vec<Scalar>) -> Self {
        Self(values)
    }

    pub fn get(&self, idx: usize) -> Option<&Scalar> {
        self.0.get(idx)
    }

    pub fn values(&self) -> &[Scalar] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_values(self) -> Vec<Scalar> {
        self.0
    }
}

impl From<Vec<Scalar>> for Row {
    fn from(values: Vec<Scalar>) -> Self {
        Row(values)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str(")")
    }
}

/// Minimal column representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Columnar batch of rows sharing one set of column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowBatch {
    pub columns: Vec<Column>,
}

impl RowBatch {
    /// A batch with the given column names and no rows.
    pub fn empty(names: &[String]) -> Self {
        Self {
            columns: names
                .iter()
                .map(|n| Column {
                    name: n.clone(),
                    values: Vec::new(),
                })
                .collect(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Build a batch by transposing rows. Short rows are padded with nulls.
    pub fn from_rows(names: &[String], rows: &[Row]) -> Self {
        let mut batch = Self::empty(names);
        for row in rows {
            batch.push_row(row);
        }
        batch
    }

    pub fn push_row(&mut self, row: &Row) {
        for (i, col) in self.columns.iter_mut().enumerate() {
            col.values.push(row.get(i).cloned().unwrap_or(Scalar::Null));
        }
    }

    pub fn row(&self, idx: usize) -> Option<Row> {
        if idx >= self.num_rows() {
            return None;
        }
        Some(Row::new(
            self.columns.iter().map(|c| c.values[idx].clone()).collect(),
        ))
    }

    /// Transpose back into rows.
    pub fn rows(&self) -> Vec<Row> {
        (0..self.num_rows()).filter_map(|i| self.row(i)).collect()
    }

    pub fn clear(&mut self) {
        for col in &mut self.columns {
            col.values.clear();
        }
    }
}
