#![forbid(unsafe_code)]
//! smerge-core: values, rows, schemas, key specifications, configuration,
//! and run manifests shared by every smerge crate.
//!
//! Keep this crate pure: no threads, no IO.

pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod key;
pub mod manifest;
pub mod prelude;
pub mod schema;
pub mod types;

/// Version string recorded in run manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
