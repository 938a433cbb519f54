//! Merge configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Verify that every input advances in key order. Costs one extra
    /// comparison per row; on by default only in debug builds.
    pub check_sorted: bool,

    /// Reject descriptor `ascending` tokens other than `Y`/`N` instead of
    /// reading them as descending.
    pub strict_descriptor: bool,

    /// Capacity of each threaded upstream queue. Producers block when full.
    pub channel_capacity: usize,

    /// Rows buffered by file sinks before a flush.
    pub batch_size: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            check_sorted: cfg!(debug_assertions),
            strict_descriptor: false,
            channel_capacity: 1024,
            batch_size: 4096,
        }
    }
}

impl MergeConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `SMERGE_CHECK_SORTED`: `1`/`true` or `0`/`false`
    /// - `SMERGE_STRICT_DESCRIPTOR`: `1`/`true` or `0`/`false`
    /// - `SMERGE_CHANNEL_CAPACITY`: upstream queue bound
    /// - `SMERGE_BATCH_SIZE`: sink flush size
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("SMERGE_CHECK_SORTED") {
            if let Some(v) = parse_flag(&s) {
                cfg.check_sorted = v;
            }
        }

        if let Ok(s) = std::env::var("SMERGE_STRICT_DESCRIPTOR") {
            if let Some(v) = parse_flag(&s) {
                cfg.strict_descriptor = v;
            }
        }

        if let Ok(s) = std::env::var("SMERGE_CHANNEL_CAPACITY") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.channel_capacity = v.max(1);
            }
        }

        if let Ok(s) = std::env::var("SMERGE_BATCH_SIZE") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.batch_size = v.max(1);
            }
        }

        cfg
    }
}

pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
