#![forbid(unsafe_code)]
//! smerge-planner: everything between a persisted description of a merge
//! and a runnable operator.
//!
//! - `descriptor`: the sorted-merge descriptor (key list + directions), its
//!   validation remarks, and the executor factory hooks.
//! - `xml`: the descriptor's `<fields>` document format.
//! - `dsl::yaml`: merge pipelines (inputs, keys, sink, config overrides).
//! - `explain`: human-readable plan text for the CLI.

pub mod descriptor;
pub mod dsl;
pub mod error;
pub mod explain;
pub mod xml;

pub use descriptor::{
    CheckRemark, MergeState, PipelineType, RemarkKind, SortedMergeDescriptor, TransformMeta,
};
pub use dsl::yaml::{parse_yaml_pipeline, ParsedPipeline, PipelineConfig, SinkFormat};
pub use error::DescriptorError;
pub use explain::explain;
