//! Sorted merge: k-way merge of pre-sorted row streams.
//!
//! `MergeDriver` is the streaming pull loop. `SortedMerge` is the operator
//! handle a descriptor hands out; it builds drivers and also implements the
//! batch `Operator` surface over fully materialised inputs.

use std::cmp::Ordering;
use std::collections::HashMap;

use smerge_core::id::InputId;
use smerge_core::key::KeySpec;
use smerge_core::prelude::{DataType, Field, Schema};
use smerge_core::types::{Row, RowBatch};

use crate::binding::{self, BoundKey};
use crate::cancel::CancelToken;
use crate::compare::Comparator;
use crate::cursor::InputCursor;
use crate::heap::MergeHeap;
use crate::memory::{CollectSink, MemorySource};
use crate::plan::OpPlan;
use crate::traits::{OpError, Operator, Push, RowSink, RowSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Init,
    Emitting,
    Done,
}

/// What a finished run reports back to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub rows_emitted: u64,
    pub rows_per_input: Vec<u64>,
    /// The run stopped early on the cancel signal or a downstream `Stop`.
    pub canceled: bool,
}

pub struct MergeDriver {
    bound: Vec<BoundKey>,
    comparator: Comparator,
    output_schema: Schema,
    cursors: Vec<InputCursor>,
    heap: MergeHeap,
    state: DriverState,
    check_sorted: bool,
    rows_emitted: u64,
}

impl MergeDriver {
    /// Bind `keys` against input 0 and check every other input's layout.
    ///
    /// Cursors are created before any check runs, so a failed bind still
    /// closes every source on the way out.
    pub fn new(
        keys: &KeySpec,
        sources: Vec<Box<dyn RowSource>>,
        check_sorted: bool,
    ) -> Result<Self, OpError> {
        if sources.is_empty() {
            return Err(OpError::Plan("no inputs connected".into()));
        }
        let cursors = sources
            .into_iter()
            .enumerate()
            .map(|(i, s)| -> Result<InputCursor, OpError> {
                let id = InputId::try_from(i)
                    .map_err(|_| OpError::Plan(format!("input {i} is out of range")))?;
                Ok(InputCursor::new(id, s))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let reference = cursors[0].schema().clone();
        let bound = binding::bind(keys, &reference)?;
        for cursor in &cursors[1..] {
            binding::check_compatible(&bound, &reference, cursor.id(), cursor.schema())?;
        }

        Ok(Self {
            comparator: Comparator::new(&bound),
            output_schema: binding::output_schema(keys, &reference),
            bound,
            cursors,
            heap: MergeHeap::default(),
            state: DriverState::Init,
            check_sorted,
            rows_emitted: 0,
        })
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    pub fn bound_keys(&self) -> &[BoundKey] {
        &self.bound
    }

    pub fn num_inputs(&self) -> usize {
        self.cursors.len()
    }

    /// Run the merge to completion, pushing every row into `sink`.
    ///
    /// A driver runs once. On success the sink has seen `finish`; on error
    /// it has not. Either way every cursor is closed when this returns.
    pub fn run(
        &mut self,
        sink: &mut dyn RowSink,
        cancel: &CancelToken,
    ) -> Result<MergeOutcome, OpError> {
        if self.state != DriverState::Init {
            return Err(OpError::Plan("merge driver already ran".into()));
        }
        let result = self.drive(sink, cancel);
        self.close_all();
        self.state = DriverState::Done;

        match result {
            Ok(canceled) => {
                tracing::debug!(
                    rows = self.rows_emitted,
                    inputs = self.cursors.len(),
                    canceled,
                    "merge done"
                );
                Ok(self.outcome(canceled))
            }
            Err(e) => {
                if e.is_canceled() {
                    tracing::debug!(rows = self.rows_emitted, "merge canceled mid-advance");
                } else {
                    tracing::warn!(rows = self.rows_emitted, error = %e, "merge failed");
                }
                Err(e)
            }
        }
    }

    /// Returns whether the run stopped early.
    fn drive(&mut self, sink: &mut dyn RowSink, cancel: &CancelToken) -> Result<bool, OpError> {
        sink.begin(&self.output_schema).map_err(downstream)?;
        self.init()?;

        self.state = DriverState::Emitting;
        tracing::debug!(active = self.heap.len(), "merge emitting");

        let mut stopped = false;
        while let Some(top) = self.heap.peek() {
            if cancel.is_canceled() {
                tracing::debug!(rows = self.rows_emitted, "cancel observed");
                stopped = true;
                break;
            }
            let row = self.cursors[top].take().ok_or_else(|| {
                OpError::Exec(format!("{} in heap without a row", self.cursors[top].id()))
            })?;
            let witness = self.check_sorted.then(|| row.clone());

            let push = sink.push(row).map_err(downstream)?;
            self.rows_emitted += 1;
            if push == Push::Stop {
                tracing::debug!(rows = self.rows_emitted, "downstream stopped");
                stopped = true;
                break;
            }
            self.advance_top(top, witness)?;
        }

        self.state = DriverState::Done;
        sink.finish().map_err(downstream)?;
        Ok(stopped)
    }

    /// Open every cursor, validate first rows, and heapify the live ones.
    fn init(&mut self) -> Result<(), OpError> {
        let mut live = Vec::with_capacity(self.cursors.len());
        for (ordinal, cursor) in self.cursors.iter_mut().enumerate() {
            cursor.open()?;
            match cursor.current() {
                Some(first) => {
                    binding::check_row(&self.bound, cursor.id(), first)?;
                    live.push(ordinal);
                }
                None => {
                    tracing::trace!(input = %cursor.id(), "input empty at open");
                    cursor.close();
                }
            }
        }
        let (cursors, cmp) = (&self.cursors, &self.comparator);
        self.heap = MergeHeap::build(live, |a, b| order(cursors, cmp, a, b));
        Ok(())
    }

    fn advance_top(&mut self, top: usize, witness: Option<Row>) -> Result<(), OpError> {
        let cursor = &mut self.cursors[top];
        cursor.advance()?;

        match cursor.current() {
            None => {
                tracing::trace!(input = %cursor.id(), rows = cursor.rows_read(), "input drained");
                cursor.close();
                let (cursors, cmp) = (&self.cursors, &self.comparator);
                self.heap.pop(|a, b| order(cursors, cmp, a, b));
            }
            Some(next) => {
                if let Some(previous) = witness {
                    if self.comparator.compare(&previous, next) == Ordering::Greater {
                        return Err(OpError::InputNotSorted {
                            input: cursor.id(),
                            previous,
                            current: next.clone(),
                        });
                    }
                }
                let (cursors, cmp) = (&self.cursors, &self.comparator);
                self.heap.sift_top(|a, b| order(cursors, cmp, a, b));
            }
        }
        Ok(())
    }

    fn close_all(&mut self) {
        for cursor in &mut self.cursors {
            cursor.close();
        }
    }

    /// Counters so far. After a failed run this is how far it got.
    pub fn progress(&self) -> MergeOutcome {
        self.outcome(false)
    }

    fn outcome(&self, canceled: bool) -> MergeOutcome {
        MergeOutcome {
            rows_emitted: self.rows_emitted,
            rows_per_input: self.cursors.iter().map(InputCursor::rows_read).collect(),
            canceled,
        }
    }
}

/// Heap order between two cursors by their lookahead rows. A cursor without
/// a row sinks below every live one.
fn order(cursors: &[InputCursor], cmp: &Comparator, a: usize, b: usize) -> Ordering {
    match (cursors[a].current(), cursors[b].current()) {
        (Some(x), Some(y)) => cmp.compare(x, y),
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn downstream(e: OpError) -> OpError {
    OpError::Downstream(Box::new(e))
}

/// Sorted merge operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedMerge {
    pub keys: KeySpec,
    pub check_sorted: bool,
}

impl SortedMerge {
    pub fn new(keys: KeySpec) -> Self {
        Self {
            keys,
            check_sorted: cfg!(debug_assertions),
        }
    }

    pub fn with_check_sorted(mut self, check_sorted: bool) -> Self {
        self.check_sorted = check_sorted;
        self
    }

    pub fn driver(&self, sources: Vec<Box<dyn RowSource>>) -> Result<MergeDriver, OpError> {
        MergeDriver::new(&self.keys, sources, self.check_sorted)
    }

    /// Merge `sources` into `sink` in one go.
    pub fn execute(
        &self,
        sources: Vec<Box<dyn RowSource>>,
        sink: &mut dyn RowSink,
        cancel: &CancelToken,
    ) -> Result<MergeOutcome, OpError> {
        self.driver(sources)?.run(sink, cancel)
    }
}

impl Operator for SortedMerge {
    fn name(&self) -> &'static str {
        "sorted_merge"
    }

    fn plan(&self, input_schemas: &[Schema]) -> Result<OpPlan, OpError> {
        let reference = input_schemas
            .first()
            .ok_or_else(|| OpError::Plan("sorted merge expects at least one input".into()))?;
        let bound = binding::bind(&self.keys, reference)?;
        for (i, schema) in input_schemas.iter().enumerate().skip(1) {
            let input = InputId::try_from(i)
                .map_err(|_| OpError::Plan(format!("input {i} is out of range")))?;
            binding::check_compatible(&bound, reference, input, schema)?;
        }
        Ok(OpPlan::new(binding::output_schema(&self.keys, reference))
            .with_sorted_by(self.keys.keys().to_vec()))
    }

    fn eval_block(&self, inputs: &[RowBatch]) -> Result<RowBatch, OpError> {
        if inputs.is_empty() {
            return Err(OpError::Exec("missing input".into()));
        }
        let types = infer_types(inputs);
        let sources: Vec<Box<dyn RowSource>> = inputs
            .iter()
            .map(|batch| {
                let schema = batch_schema(batch, &types);
                Box::new(MemorySource::from_batch(schema, batch)) as Box<dyn RowSource>
            })
            .collect();

        let mut sink = CollectSink::new();
        self.execute(sources, &mut sink, &CancelToken::new())?;
        Ok(sink.into_batch())
    }
}

/// Column types for schema-less batches: the first non-null value seen under
/// each column name across all inputs. All-null columns default to `Utf8`.
fn infer_types(inputs: &[RowBatch]) -> HashMap<&str, DataType> {
    let mut types = HashMap::new();
    for batch in inputs {
        for col in &batch.columns {
            if types.contains_key(col.name.as_str()) {
                continue;
            }
            if let Some(ty) = col.values.iter().find_map(|v| v.data_type()) {
                types.insert(col.name.as_str(), ty);
            }
        }
    }
    types
}

fn batch_schema(batch: &RowBatch, types: &HashMap<&str, DataType>) -> Schema {
    Schema::new(
        batch
            .columns
            .iter()
            .map(|c| {
                let ty = types.get(c.name.as_str()).copied().unwrap_or(DataType::Utf8);
                Field::new(c.name.clone(), ty, true)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use smerge_core::key::SortKey;
    use smerge_core::prelude::{Column, Scalar, SortDirection};
    use std::sync::atomic::Ordering as AtomicOrdering;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn schema(cols: &[(&str, DataType)]) -> Schema {
        Schema::new(
            cols.iter()
                .map(|(n, t)| Field::new(*n, *t, true))
                .collect(),
        )
    }

    fn k_schema() -> Schema {
        schema(&[("k", DataType::Int64)])
    }

    fn ints(values: &[i64]) -> Vec<Row> {
        values.iter().map(|v| Row::new(vec![Scalar::I64(*v)])).collect()
    }

    fn int_source(values: &[i64]) -> Box<dyn RowSource> {
        Box::new(MemorySource::new(k_schema(), ints(values)))
    }

    fn merge(keys: Vec<SortKey>, sources: Vec<Box<dyn RowSource>>) -> (MergeOutcome, CollectSink) {
        let mut sink = CollectSink::new();
        let outcome = SortedMerge::new(keys.into())
            .with_check_sorted(true)
            .execute(sources, &mut sink, &CancelToken::new())
            .unwrap();
        (outcome, sink)
    }

    fn first_ints(rows: &[Row]) -> Vec<i64> {
        rows.iter()
            .map(|r| match r.get(0) {
                Some(Scalar::I64(v)) => *v,
                other => panic!("unexpected value {other:?}"),
            })
            .collect()
    }

    #[test]
    fn two_ascending_inputs_interleave() {
        let (outcome, sink) = merge(
            vec![SortKey::asc("k")],
            vec![int_source(&[1, 3, 5]), int_source(&[2, 4, 6])],
        );
        assert_eq!(first_ints(&sink.rows), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(outcome.rows_emitted, 6);
        assert_eq!(outcome.rows_per_input, vec![3, 3]);
        assert!(!outcome.canceled);
        assert!(sink.finished);
    }

    #[test]
    fn three_descending_inputs() {
        let (_, sink) = merge(
            vec![SortKey::desc("k")],
            vec![
                int_source(&[9, 5, 1]),
                int_source(&[8, 4, 0]),
                int_source(&[7, 3]),
            ],
        );
        assert_eq!(first_ints(&sink.rows), vec![9, 8, 7, 5, 4, 3, 1, 0]);
    }

    #[test]
    fn ties_go_to_the_lower_ordinal_input() {
        let s = schema(&[("k", DataType::Int64), ("tag", DataType::Utf8)]);
        let row = |k: i64, tag: &str| Row::new(vec![Scalar::I64(k), Scalar::Str(tag.into())]);
        let a = MemorySource::new(s.clone(), vec![row(1, "a0"), row(1, "a1")]);
        let b = MemorySource::new(s, vec![row(1, "b0")]);
        let (_, sink) = merge(vec![SortKey::asc("k")], vec![Box::new(a), Box::new(b)]);
        let tags: Vec<String> = sink.rows.iter().map(|r| r.get(1).unwrap().to_string()).collect();
        assert_eq!(tags, vec!["a0", "a1", "b0"]);
    }

    #[test]
    fn tie_order_follows_ordinal_not_arrival() {
        let s = schema(&[("k", DataType::Int64), ("tag", DataType::Utf8)]);
        let row = |k: i64, tag: &str| Row::new(vec![Scalar::I64(k), Scalar::Str(tag.into())]);
        let sources: Vec<Box<dyn RowSource>> = vec![
            Box::new(MemorySource::new(s.clone(), vec![row(2, "a")])),
            Box::new(MemorySource::new(s.clone(), vec![row(1, "b"), row(2, "b")])),
            Box::new(MemorySource::new(s, vec![row(2, "c")])),
        ];
        let (_, sink) = merge(vec![SortKey::asc("k")], sources);
        let tags: Vec<String> = sink.rows.iter().map(|r| r.get(1).unwrap().to_string()).collect();
        assert_eq!(tags, vec!["b", "a", "b", "c"]);
    }

    #[test]
    fn nulls_come_first_ascending() {
        let a = MemorySource::new(
            k_schema(),
            vec![Row::new(vec![Scalar::Null]), Row::new(vec![Scalar::I64(2)])],
        );
        let (_, sink) = merge(vec![SortKey::asc("k")], vec![Box::new(a), int_source(&[1, 3])]);
        assert_eq!(sink.rows[0], Row::new(vec![Scalar::Null]));
        assert_eq!(first_ints(&sink.rows[1..]), vec![1, 2, 3]);
    }

    #[test]
    fn mixed_directions() {
        let s = schema(&[("k1", DataType::Int64), ("k2", DataType::Int64)]);
        let rows = |pairs: &[(i64, i64)]| -> Vec<Row> {
            pairs
                .iter()
                .map(|(x, y)| Row::new(vec![Scalar::I64(*x), Scalar::I64(*y)]))
                .collect()
        };
        let a = MemorySource::new(s.clone(), rows(&[(1, 9), (1, 5), (2, 3)]));
        let b = MemorySource::new(s, rows(&[(1, 7), (2, 8)]));
        let (_, sink) = merge(
            vec![SortKey::asc("k1"), SortKey::desc("k2")],
            vec![Box::new(a), Box::new(b)],
        );
        assert_eq!(sink.rows, rows(&[(1, 9), (1, 7), (1, 5), (2, 8), (2, 3)]));
    }

    #[test]
    fn empty_key_spec_concatenates_by_ordinal() {
        let (_, sink) = merge(vec![], vec![int_source(&[5, 1]), int_source(&[9, 0])]);
        assert_eq!(first_ints(&sink.rows), vec![5, 1, 9, 0]);
    }

    #[test]
    fn empty_inputs_are_skipped() {
        let (outcome, sink) = merge(
            vec![SortKey::asc("k")],
            vec![
                int_source(&[]),
                int_source(&[2, 4]),
                int_source(&[]),
                int_source(&[1, 3]),
            ],
        );
        assert_eq!(first_ints(&sink.rows), vec![1, 2, 3, 4]);
        assert_eq!(outcome.rows_per_input, vec![0, 2, 0, 2]);
    }

    #[test]
    fn all_inputs_empty_is_immediate_eof() {
        let (outcome, sink) = merge(vec![SortKey::asc("k")], vec![int_source(&[]), int_source(&[])]);
        assert!(sink.rows.is_empty());
        assert!(sink.finished);
        assert_eq!(outcome.rows_emitted, 0);
    }

    #[test]
    fn single_input_passes_through() {
        let (_, sink) = merge(vec![SortKey::asc("k")], vec![int_source(&[1, 1, 2, 7])]);
        assert_eq!(first_ints(&sink.rows), vec![1, 1, 2, 7]);
    }

    #[test]
    fn remerge_with_empty_input_is_identity() {
        let (_, first) = merge(
            vec![SortKey::asc("k")],
            vec![int_source(&[1, 4, 4]), int_source(&[2, 4, 9])],
        );
        let again = MemorySource::new(k_schema(), first.rows.clone());
        let (_, second) = merge(vec![SortKey::asc("k")], vec![Box::new(again), int_source(&[])]);
        assert_eq!(first.rows, second.rows);
    }

    #[test]
    fn output_schema_marks_key_direction() {
        let mut sink = CollectSink::new();
        SortedMerge::new(vec![SortKey::desc("k")].into())
            .execute(vec![int_source(&[1])], &mut sink, &CancelToken::new())
            .unwrap();
        let schema = sink.schema.unwrap();
        assert_eq!(schema.fields[0].sorted, Some(SortDirection::Descending));
    }

    #[test]
    fn unsorted_input_is_reported() {
        let mut sink = CollectSink::new();
        let err = SortedMerge::new(vec![SortKey::asc("k")].into())
            .with_check_sorted(true)
            .execute(
                vec![int_source(&[1, 5, 3]), int_source(&[2])],
                &mut sink,
                &CancelToken::new(),
            )
            .unwrap_err();
        match err {
            OpError::InputNotSorted {
                input,
                previous,
                current,
            } => {
                assert_eq!(input, InputId::new(0));
                assert_eq!(previous, Row::new(vec![Scalar::I64(5)]));
                assert_eq!(current, Row::new(vec![Scalar::I64(3)]));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(!sink.finished);
    }

    #[test]
    fn unchecked_mode_passes_unsorted_rows_through() {
        let mut sink = CollectSink::new();
        SortedMerge::new(vec![SortKey::asc("k")].into())
            .with_check_sorted(false)
            .execute(vec![int_source(&[3, 1])], &mut sink, &CancelToken::new())
            .unwrap();
        assert_eq!(first_ints(&sink.rows), vec![3, 1]);
    }

    fn tracked(source: MemorySource) -> (Box<dyn RowSource>, Arc<AtomicBool>) {
        let flag = source.closed_flag();
        (Box::new(source), flag)
    }

    #[test]
    fn upstream_failure_closes_every_input() {
        let (a, a_closed) = tracked(MemorySource::new(k_schema(), ints(&[1, 2, 3, 4])));
        let (b, b_closed) = tracked(MemorySource::failing(k_schema(), ints(&[2]), "socket reset"));
        let mut sink = CollectSink::new();
        let err = SortedMerge::new(vec![SortKey::asc("k")].into())
            .execute(vec![a, b], &mut sink, &CancelToken::new())
            .unwrap_err();
        match err {
            OpError::Upstream { input, cause } => {
                assert_eq!(input, InputId::new(1));
                assert!(cause.to_string().contains("socket reset"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(a_closed.load(AtomicOrdering::Acquire));
        assert!(b_closed.load(AtomicOrdering::Acquire));
        assert!(!sink.finished);
    }

    #[test]
    fn cancel_between_emissions_is_clean() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let (a, a_closed) = tracked(MemorySource::new(k_schema(), ints(&[1, 2])));
        let mut sink = CollectSink::new();
        let outcome = SortedMerge::new(vec![SortKey::asc("k")].into())
            .execute(vec![a], &mut sink, &cancel)
            .unwrap();
        assert!(outcome.canceled);
        assert_eq!(outcome.rows_emitted, 0);
        assert!(sink.finished);
        assert!(a_closed.load(AtomicOrdering::Acquire));
    }

    #[test]
    fn cancel_mid_advance_propagates_and_closes() {
        let (a, a_closed) = tracked(MemorySource::canceling(k_schema(), ints(&[1])));
        let (b, b_closed) = tracked(MemorySource::new(k_schema(), ints(&[2, 3])));
        let mut sink = CollectSink::new();
        let err = SortedMerge::new(vec![SortKey::asc("k")].into())
            .execute(vec![a, b], &mut sink, &CancelToken::new())
            .unwrap_err();
        assert!(err.is_canceled());
        assert_eq!(sink.rows.len(), 1);
        assert!(a_closed.load(AtomicOrdering::Acquire));
        assert!(b_closed.load(AtomicOrdering::Acquire));
    }

    #[test]
    fn downstream_stop_ends_the_run() {
        let (a, a_closed) = tracked(MemorySource::new(k_schema(), ints(&[1, 3, 5])));
        let mut sink = CollectSink::stop_after(2);
        let outcome = SortedMerge::new(vec![SortKey::asc("k")].into())
            .execute(vec![a, int_source(&[2, 4])], &mut sink, &CancelToken::new())
            .unwrap();
        assert_eq!(first_ints(&sink.rows), vec![1, 2]);
        assert!(outcome.canceled);
        assert_eq!(outcome.rows_emitted, 2);
        assert!(sink.finished);
        assert!(a_closed.load(AtomicOrdering::Acquire));
    }

    #[test]
    fn downstream_failure_is_wrapped() {
        let mut sink = CollectSink::fail_after(1);
        let err = SortedMerge::new(vec![SortKey::asc("k")].into())
            .execute(vec![int_source(&[1, 2])], &mut sink, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, OpError::Downstream(_)));
        assert!(!sink.finished);
    }

    #[test]
    fn zero_inputs_is_a_plan_error() {
        let err = MergeDriver::new(&KeySpec::default(), vec![], true).err();
        assert!(matches!(err, Some(OpError::Plan(_))));
    }

    #[test]
    fn bind_failure_closes_sources() {
        let (a, a_closed) = tracked(MemorySource::new(k_schema(), ints(&[1])));
        let err = MergeDriver::new(&vec![SortKey::asc("missing")].into(), vec![a], true).err();
        assert!(matches!(err, Some(OpError::KeyNotFound { .. })));
        assert!(a_closed.load(AtomicOrdering::Acquire));
    }

    #[test]
    fn incompatible_key_column_is_rejected() {
        let other = MemorySource::new(schema(&[("k", DataType::Utf8)]), vec![]);
        let err = MergeDriver::new(
            &vec![SortKey::asc("k")].into(),
            vec![int_source(&[1]), Box::new(other)],
            true,
        )
        .err();
        match err {
            Some(OpError::SchemaMismatch { input, field, .. }) => {
                assert_eq!(input, InputId::new(1));
                assert_eq!(field, "k");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn reordered_value_columns_are_rejected_and_closed() {
        let row = |k: i64, x: &str, y: &str| {
            Row::new(vec![Scalar::I64(k), Scalar::Str(x.into()), Scalar::Str(y.into())])
        };
        let (a, a_closed) = tracked(MemorySource::new(
            schema(&[("id", DataType::Int64), ("name", DataType::Utf8), ("city", DataType::Utf8)]),
            vec![row(1, "ann", "oslo")],
        ));
        let (b, b_closed) = tracked(MemorySource::new(
            schema(&[("id", DataType::Int64), ("city", DataType::Utf8), ("name", DataType::Utf8)]),
            vec![row(2, "rome", "bob")],
        ));
        let err = MergeDriver::new(&vec![SortKey::asc("id")].into(), vec![a, b], true).err();
        match err {
            Some(OpError::SchemaMismatch { input, field, .. }) => {
                assert_eq!(input, InputId::new(1));
                assert_eq!(field, "name");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(a_closed.load(AtomicOrdering::Acquire));
        assert!(b_closed.load(AtomicOrdering::Acquire));
    }

    #[test]
    fn plan_rejects_a_wider_input() {
        let op = SortedMerge::new(vec![SortKey::asc("k")].into());
        let wide = schema(&[("k", DataType::Int64), ("extra", DataType::Utf8)]);
        assert!(matches!(
            op.plan(&[k_schema(), wide]),
            Err(OpError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn first_row_type_mismatch_fails_at_init() {
        let bad = MemorySource::new(k_schema(), vec![Row::new(vec![Scalar::Str("x".into())])]);
        let mut sink = CollectSink::new();
        let err = SortedMerge::new(vec![SortKey::asc("k")].into())
            .execute(vec![int_source(&[1]), Box::new(bad)], &mut sink, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, OpError::SchemaMismatch { .. }));
        assert!(sink.rows.is_empty());
    }

    #[test]
    fn driver_runs_once() {
        let mut driver = SortedMerge::new(vec![SortKey::asc("k")].into())
            .driver(vec![int_source(&[1])])
            .unwrap();
        assert_eq!(driver.state(), DriverState::Init);
        driver.run(&mut CollectSink::new(), &CancelToken::new()).unwrap();
        assert_eq!(driver.state(), DriverState::Done);
        assert!(driver
            .run(&mut CollectSink::new(), &CancelToken::new())
            .is_err());
    }

    #[test]
    fn plan_resolves_schema_without_data() {
        let op = SortedMerge::new(vec![SortKey::asc("k")].into());
        let plan = op.plan(&[k_schema(), k_schema()]).unwrap();
        assert_eq!(plan.output_schema.fields[0].sorted, Some(SortDirection::Ascending));
        assert_eq!(plan.sorted_by, vec![SortKey::asc("k")]);
        assert!(op.plan(&[]).is_err());
    }

    #[test]
    fn eval_block_merges_batches() {
        let batch = |ks: Vec<Scalar>| RowBatch {
            columns: vec![Column {
                name: "k".into(),
                values: ks,
            }],
        };
        let a = batch(vec![Scalar::Null, Scalar::I64(4)]);
        let b = batch(vec![Scalar::I64(1), Scalar::I64(9)]);
        let out = SortedMerge::new(vec![SortKey::asc("k")].into())
            .eval_block(&[a, b])
            .unwrap();
        assert_eq!(
            out.columns[0].values,
            vec![Scalar::Null, Scalar::I64(1), Scalar::I64(4), Scalar::I64(9)]
        );
    }
}
