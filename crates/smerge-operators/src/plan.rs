//! Operator planning surface.

use serde::{Deserialize, Serialize};
use smerge_core::key::SortKey;
use smerge_core::prelude::Schema;

/// Operator plan: output schema and the order the output is guaranteed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpPlan {
    pub output_schema: Schema,

    /// Keys the output stream is sorted by, most significant first.
    pub sorted_by: Vec<SortKey>,
}

impl OpPlan {
    pub fn new(output_schema: Schema) -> Self {
        Self {
            output_schema,
            sorted_by: vec![],
        }
    }

    pub fn with_sorted_by(mut self, keys: Vec<SortKey>) -> Self {
        self.sorted_by = keys;
        self
    }
}
