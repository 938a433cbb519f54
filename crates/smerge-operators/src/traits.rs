//! Operator trait + the upstream/downstream contracts the merge driver runs
//! against.
//!
//! The host supplies one `RowSource` per upstream and a single `RowSink`.
//! Sources may block inside `pull`; the driver treats that as an ordinary
//! call. Sinks may block inside `push` to apply backpressure.

use smerge_core::id::InputId;
use smerge_core::prelude::Schema;
use smerge_core::types::{Row, RowBatch};

use crate::plan::OpPlan;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("merge key field '{field}' not found in input schema")]
    KeyNotFound { field: String },

    #[error("schema mismatch on {input} for key '{field}': {detail}")]
    SchemaMismatch {
        input: InputId,
        field: String,
        detail: String,
    },

    #[error("{input} is not sorted: {current} arrived after {previous}")]
    InputNotSorted {
        input: InputId,
        previous: Row,
        current: Row,
    },

    #[error("upstream {input} failed: {cause}")]
    Upstream {
        input: InputId,
        #[source]
        cause: Box<OpError>,
    },

    #[error("downstream refused row: {0}")]
    Downstream(#[source] Box<OpError>),

    #[error("canceled")]
    Canceled,

    #[error("planning error: {0}")]
    Plan(String),

    #[error("execution error: {0}")]
    Exec(String),
}

impl OpError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, OpError::Canceled)
    }
}

/// Pull handle over one upstream stream.
pub trait RowSource: Send {
    /// Schema of the rows this source yields. Available before the first pull.
    fn schema(&self) -> &Schema;

    /// Next row, or `None` at end of stream. May block.
    fn pull(&mut self) -> Result<Option<Row>, OpError>;

    /// Release the upstream. Called exactly once by the owning cursor.
    fn close(&mut self) {}
}

/// Whether the downstream wants more rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    Continue,
    /// Downstream is done (cancel/abort); the driver stops cleanly.
    Stop,
}

/// Single downstream consumer of merged rows.
pub trait RowSink {
    /// Called once with the output schema before the first row.
    fn begin(&mut self, _schema: &Schema) -> Result<(), OpError> {
        Ok(())
    }

    fn push(&mut self, row: Row) -> Result<Push, OpError>;

    /// End of stream.
    fn finish(&mut self) -> Result<(), OpError>;
}

impl<S: RowSink + ?Sized> RowSink for &mut S {
    fn begin(&mut self, schema: &Schema) -> Result<(), OpError> {
        (**self).begin(schema)
    }

    fn push(&mut self, row: Row) -> Result<Push, OpError> {
        (**self).push(row)
    }

    fn finish(&mut self) -> Result<(), OpError> {
        (**self).finish()
    }
}

/// Batch-mode operator surface.
///
/// Invariants:
/// - `plan` must not touch any data; it only resolves schemas.
/// - `eval_block` must be deterministic given the same inputs.
pub trait Operator: Send + Sync + 'static {
    /// Human-readable operator name (stable).
    fn name(&self) -> &'static str;

    /// Given input schemas, return the output schema and ordering.
    fn plan(&self, input_schemas: &[Schema]) -> Result<OpPlan, OpError>;

    /// Evaluate fully materialised inputs, one batch per upstream.
    fn eval_block(&self, inputs: &[RowBatch]) -> Result<RowBatch, OpError>;
}
