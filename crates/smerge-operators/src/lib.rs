#![forbid(unsafe_code)]
//! smerge-operators: the streaming sorted-merge core.
//!
//! Design intent:
//! - Pure and synchronous: the driver is a pull engine that advances one
//!   upstream at a time. Blocking, if any, happens inside `RowSource::pull`.
//! - The comparator is the only authority on row order. Ties between inputs
//!   are broken by input ordinal inside the heap, never by heap internals.
//! - Every cursor is closed on every exit path (completion, error, cancel).

pub mod binding;
pub mod cancel;
pub mod compare;
pub mod cursor;
pub mod heap;
pub mod memory;
pub mod merge;
pub mod plan;
pub mod traits;

pub use binding::{bind, BoundKey};
pub use cancel::CancelToken;
pub use compare::Comparator;
pub use merge::{DriverState, MergeDriver, MergeOutcome, SortedMerge};
pub use plan::OpPlan;
pub use traits::{OpError, Operator, Push, RowSink, RowSource};
