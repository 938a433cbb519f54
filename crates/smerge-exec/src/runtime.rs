//! Runtime: resolve a descriptor into an executor, run it, and record a
//! `RunManifest`.
//!
//! Cancellation is not an error at this level. A run that stops on the
//! cancel signal, on a downstream `Stop`, or with `Canceled` raised by an
//! upstream still returns a manifest, with `canceled` set.

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use smerge_core::config::MergeConfig;
use smerge_core::hash::hash_serde;
use smerge_core::manifest::RunManifest;

use smerge_io::{CsvSource, CsvWriter, JsonlWriter};
use smerge_operators::{CancelToken, OpError, RowSink, RowSource};
use smerge_planner::{
    DescriptorError, MergeState, ParsedPipeline, SinkFormat, SortedMergeDescriptor, TransformMeta,
};

use crate::metrics::emit_span;
use crate::scheduler::spawn_upstream;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("descriptor: {0}")]
    Descriptor(#[from] DescriptorError),
    #[error("operator exec: {0}")]
    Operator(#[from] OpError),
    #[error("io: {0}")]
    Io(#[from] smerge_io::Error),
    #[error("invalid pipeline: {0}")]
    Invalid(String),
    #[error("hashing error: {0}")]
    Hash(String),
}

/// Engine owns the configuration and the executor state across runs.
pub struct Engine {
    cfg: MergeConfig,
    state: MergeState,
}

impl Engine {
    pub fn new(cfg: MergeConfig) -> Self {
        Self {
            cfg,
            state: MergeState::default(),
        }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.cfg
    }

    pub fn state(&self) -> &MergeState {
        &self.state
    }

    /// Merge `inputs` into `sink` under `descriptor`.
    pub fn run(
        &mut self,
        descriptor: &SortedMergeDescriptor,
        inputs: Vec<Box<dyn RowSource>>,
        sink: &mut dyn RowSink,
        cancel: &CancelToken,
    ) -> Result<RunManifest, ExecError> {
        let descriptor_hash =
            hash_serde(&descriptor.key_spec()).map_err(|e| ExecError::Hash(e.to_string()))?;
        let mut manifest = RunManifest::new(descriptor_hash, inputs.len(), now_ms());

        let executor = descriptor.create_executor(&self.cfg);
        let mut driver = executor.driver(inputs)?;
        tracing::debug!(
            inputs = driver.num_inputs(),
            keys = descriptor.fields.len(),
            descriptor = %descriptor_hash.short(),
            "merge run starting"
        );

        let outcome = match driver.run(sink, cancel) {
            Ok(outcome) => outcome,
            Err(OpError::Canceled) => {
                let mut progress = driver.progress();
                progress.canceled = true;
                progress
            }
            Err(e) => {
                tracing::error!(error = %e, "merge run failed");
                return Err(e.into());
            }
        };
        self.state.record(&outcome);

        manifest.rows_emitted = outcome.rows_emitted;
        manifest.rows_per_input = outcome.rows_per_input;
        manifest.canceled = outcome.canceled;
        let manifest = manifest.finish(now_ms());

        emit_span(
            "merge.run",
            &[
                ("rows", manifest.rows_emitted.to_string()),
                ("ms", manifest.duration_ms().to_string()),
                ("canceled", manifest.canceled.to_string()),
            ],
        );
        Ok(manifest)
    }

    /// Validate, open, and run a parsed pipeline. Each CSV input is read on
    /// its own producer thread.
    pub fn run_pipeline(
        &mut self,
        pipeline: &ParsedPipeline,
        cancel: &CancelToken,
    ) -> Result<RunManifest, ExecError> {
        let remarks = pipeline
            .descriptor
            .validate(pipeline.reference_schema(), &pipeline.input_names());
        let errors: Vec<String> = remarks
            .iter()
            .filter(|r| r.is_error())
            .map(|r| r.message.trim_end().to_string())
            .collect();
        if !errors.is_empty() {
            return Err(ExecError::Invalid(errors.join("; ")));
        }

        let mut sources: Vec<Box<dyn RowSource>> = Vec::with_capacity(pipeline.inputs.len());
        for input in &pipeline.inputs {
            let csv = CsvSource::open(&input.source, input.schema.clone())?;
            let upstream = spawn_upstream(
                input.source.clone(),
                Box::new(csv),
                self.cfg.channel_capacity,
                cancel.clone(),
            )
            .map_err(smerge_io::Error::from)?;
            sources.push(Box::new(upstream));
        }

        let dest = &pipeline.sink.destination;
        let batch = self.cfg.batch_size;
        match pipeline.sink.format {
            SinkFormat::Csv => {
                let mut sink = CsvWriter::to_path(dest)?.with_flush_every(batch);
                self.run(&pipeline.descriptor, sources, &mut sink, cancel)
            }
            SinkFormat::Jsonl => {
                let mut sink = JsonlWriter::to_path(dest, None)?.with_flush_every(batch);
                self.run(&pipeline.descriptor, sources, &mut sink, cancel)
            }
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
