//! Run manifest recorded after every merge run.
//!
//! Captures what was merged (descriptor hash, input count), how much flowed
//! through each input, and how the run ended.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: ManifestId,

    /// Stable hash of the descriptor (key list and directions).
    pub descriptor_hash: Hash256,

    /// Engine version string for provenance.
    pub engine_version: String,

    /// Total rows pushed downstream.
    pub rows_emitted: u64,

    /// Rows consumed from each input, indexed by input ordinal.
    pub rows_per_input: Vec<u64>,

    /// True when the run stopped on cancellation or a downstream refusal.
    pub canceled: bool,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunManifest {
    pub fn new(descriptor_hash: Hash256, inputs: usize, started_ms: u64) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            descriptor_hash,
            engine_version: crate::VERSION.to_string(),
            rows_emitted: 0,
            rows_per_input: vec![0; inputs],
            canceled: false,
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(mut self, finished_ms: u64) -> Self {
        self.finished_ms = finished_ms;
        self
    }

    pub fn duration_ms(&self) -> u64 {
        self.finished_ms.saturating_sub(self.started_ms)
    }
}
