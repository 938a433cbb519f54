#![forbid(unsafe_code)]
//! smerge-exec: the host side of a merge run.
//!
//! The engine resolves a descriptor into an executor, feeds it upstreams
//! (optionally on producer threads behind bounded queues), and records a
//! `RunManifest` for every run, including canceled ones.

pub mod metrics;
pub mod runtime;
pub mod scheduler;

pub use runtime::{Engine, ExecError};
pub use scheduler::{spawn_upstream, ChannelSource};
