//! Convenient re-exports for downstream crates.

pub use crate::config::MergeConfig;
pub use crate::error::{Error, Result};
pub use crate::id::InputId;
pub use crate::key::{KeySpec, SortKey};
pub use crate::manifest::{ManifestId, RunManifest};
pub use crate::schema::{Collation, DataType, Field, Schema, SortDirection, TypeClass};
pub use crate::types::{Column, Row, RowBatch, Scalar};
