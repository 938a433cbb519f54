//! Input cursor: one upstream plus a single-row lookahead.
//!
//! While not drained, `lookahead` holds exactly one row that has not been
//! emitted yet. The cursor owns that row until the driver takes it.

use smerge_core::id::InputId;
use smerge_core::prelude::{Row, Schema};

use crate::traits::{OpError, RowSource};

pub struct InputCursor {
    id: InputId,
    source: Box<dyn RowSource>,
    lookahead: Option<Row>,
    drained: bool,
    closed: bool,
    rows_read: u64,
}

impl InputCursor {
    pub fn new(id: InputId, source: Box<dyn RowSource>) -> Self {
        Self {
            id,
            source,
            lookahead: None,
            drained: false,
            closed: false,
            rows_read: 0,
        }
    }

    pub fn id(&self) -> InputId {
        self.id
    }

    pub fn schema(&self) -> &Schema {
        self.source.schema()
    }

    /// Pull the first row. An immediately empty source leaves the cursor drained.
    pub fn open(&mut self) -> Result<(), OpError> {
        self.advance()
    }

    /// The lookahead row; `None` once drained.
    pub fn current(&self) -> Option<&Row> {
        self.lookahead.as_ref()
    }

    /// Hand the lookahead row over for emission. Must be followed by `advance`.
    pub fn take(&mut self) -> Option<Row> {
        self.lookahead.take()
    }

    /// Pull the next row into the lookahead slot.
    pub fn advance(&mut self) -> Result<(), OpError> {
        if self.drained {
            self.lookahead = None;
            return Ok(());
        }
        match self.source.pull() {
            Ok(Some(row)) => {
                self.rows_read += 1;
                self.lookahead = Some(row);
                Ok(())
            }
            Ok(None) => {
                self.lookahead = None;
                self.drained = true;
                Ok(())
            }
            Err(OpError::Canceled) => Err(OpError::Canceled),
            Err(cause) => Err(OpError::Upstream {
                input: self.id,
                cause: Box::new(cause),
            }),
        }
    }

    pub fn is_drained(&self) -> bool {
        self.drained
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Release the upstream handle. Idempotent.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.lookahead = None;
            self.source.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for InputCursor {
    fn drop(&mut self) {
        self.close();
    }
}
