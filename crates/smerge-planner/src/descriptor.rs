//! Sorted-merge descriptor: the persisted configuration of one merge step.
//!
//! The descriptor owns the key list, reads and writes it, validates it
//! against the upstream schema, and is the only way to obtain an executor.

use serde::{Deserialize, Serialize};

use smerge_core::config::MergeConfig;
use smerge_core::key::{KeySpec, SortKey};
use smerge_core::prelude::Schema;
use smerge_operators::binding;
use smerge_operators::{MergeOutcome, SortedMerge};

use crate::error::Result;
use crate::xml;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemarkKind {
    Ok,
    Error,
}

/// One line of a `validate` report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRemark {
    pub kind: RemarkKind,
    pub message: String,
}

impl CheckRemark {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            kind: RemarkKind::Ok,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: RemarkKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == RemarkKind::Error
    }
}

impl std::fmt::Display for CheckRemark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.kind {
            RemarkKind::Ok => "OK",
            RemarkKind::Error => "ERROR",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

/// Pipeline kinds a transform can run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineType {
    Normal,
}

/// Per-executor bookkeeping, created alongside each executor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeState {
    pub runs: u64,
    pub rows_emitted: u64,
    pub last: Option<MergeOutcome>,
}

impl MergeState {
    pub fn record(&mut self, outcome: &MergeOutcome) {
        self.runs += 1;
        self.rows_emitted += outcome.rows_emitted;
        self.last = Some(outcome.clone());
    }
}

/// Capabilities a transform descriptor offers its host.
pub trait TransformMeta: Sized {
    type Executor;
    type State;

    /// Persisted form.
    fn serialize(&self) -> String;

    fn deserialize(doc: &str, strict: bool) -> Result<Self>;

    /// Check the descriptor against the upstream schema (`None` when the
    /// host could not resolve one) and the names of connected inputs.
    fn validate(&self, previous: Option<&Schema>, inputs: &[String]) -> Vec<CheckRemark>;

    /// Schema the transform emits given its reference input schema.
    fn resolve_output_schema(&self, input: &Schema) -> Schema;

    fn create_executor(&self, config: &MergeConfig) -> Self::Executor;

    fn create_executor_state(&self) -> Self::State;

    fn supported_pipeline_types(&self) -> &'static [PipelineType] {
        &[PipelineType::Normal]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortedMergeDescriptor {
    pub fields: Vec<SortKey>,
}

impl SortedMergeDescriptor {
    pub fn new(fields: Vec<SortKey>) -> Self {
        Self { fields }
    }

    /// Resize to `n` keys. New keys are unnamed and ascending.
    pub fn allocate(&mut self, n: usize) {
        self.fields.resize_with(n, || SortKey::asc(""));
    }

    /// Reset to the empty key list.
    pub fn set_default(&mut self) {
        self.fields.clear();
    }

    /// Rebuild the key list from independently injected name and direction
    /// lists. The name list decides the length; missing directions are
    /// ascending, surplus directions are dropped.
    pub fn normalize_injection(&mut self, names: &[String], ascending: &[bool]) {
        self.fields = names
            .iter()
            .enumerate()
            .map(|(i, name)| SortKey::new(name.clone(), ascending.get(i).copied().unwrap_or(true)))
            .collect();
    }

    pub fn key_spec(&self) -> KeySpec {
        KeySpec::new(self.fields.clone())
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|k| k.name.clone()).collect()
    }

    pub fn ascending(&self) -> Vec<bool> {
        self.fields.iter().map(|k| k.ascending).collect()
    }
}

impl TransformMeta for SortedMergeDescriptor {
    type Executor = SortedMerge;
    type State = MergeState;

    fn serialize(&self) -> String {
        xml::write_fields(&self.fields)
    }

    fn deserialize(doc: &str, strict: bool) -> Result<Self> {
        Ok(Self::new(xml::read_fields(doc, strict)?))
    }

    fn validate(&self, previous: Option<&Schema>, inputs: &[String]) -> Vec<CheckRemark> {
        let mut remarks = Vec::new();

        match previous.filter(|s| !s.is_empty()) {
            Some(schema) => {
                remarks.push(CheckRemark::ok(format!(
                    "Transform is connected to previous one, receiving {} fields",
                    schema.len()
                )));
                let spec = self.key_spec();
                let missing = binding::unresolved(&spec, schema);
                if !missing.is_empty() {
                    let mut msg = String::from("Sort keys that were not found in input stream:\n");
                    for name in missing {
                        msg.push_str(&format!("\t\t{name}\n"));
                    }
                    remarks.push(CheckRemark::error(msg));
                } else if !self.fields.is_empty() {
                    remarks.push(CheckRemark::ok("All sort keys are found in the input stream."));
                } else {
                    remarks.push(CheckRemark::error("No sort keys are entered."));
                }
            }
            None => remarks.push(CheckRemark::error(
                "Couldn't read fields from the previous transform.",
            )),
        }

        if inputs.is_empty() {
            remarks.push(CheckRemark::error("No input received from other transforms!"));
        } else {
            remarks.push(CheckRemark::ok(format!(
                "Transform is receiving info from {} other transforms.",
                inputs.len()
            )));
        }
        remarks
    }

    fn resolve_output_schema(&self, input: &Schema) -> Schema {
        binding::output_schema(&self.key_spec(), input)
    }

    fn create_executor(&self, config: &MergeConfig) -> SortedMerge {
        SortedMerge::new(self.key_spec()).with_check_sorted(config.check_sorted)
    }

    fn create_executor_state(&self) -> MergeState {
        MergeState::default()
    }
}
