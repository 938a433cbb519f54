use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use smerge_core::prelude::{DataType, Field, KeySpec, Row, Scalar, Schema, SortKey};
use smerge_operators::memory::{CollectSink, MemorySource};
use smerge_operators::{CancelToken, RowSource, SortedMerge};

fn schema() -> Schema {
    Schema::new(vec![
        Field::new("k", DataType::Int64, false),
        Field::new("payload", DataType::Utf8, false),
    ])
}

/// `inputs` interleaved ascending runs of `rows` rows each.
fn make_runs(inputs: usize, rows: usize) -> Vec<Vec<Row>> {
    (0..inputs)
        .map(|i| {
            (0..rows)
                .map(|r| {
                    let k = (r * inputs + i) as i64;
                    Row::new(vec![Scalar::I64(k), Scalar::Str(format!("row-{k}"))])
                })
                .collect()
        })
        .collect()
}

fn sources(runs: &[Vec<Row>]) -> Vec<Box<dyn RowSource>> {
    runs.iter()
        .map(|rows| Box::new(MemorySource::new(schema(), rows.clone())) as Box<dyn RowSource>)
        .collect()
}

fn bench_k_way_merge(c: &mut Criterion) {
    let op = SortedMerge::new(KeySpec::new(vec![SortKey::asc("k")])).with_check_sorted(false);
    let mut group = c.benchmark_group("sorted_merge");
    for inputs in [2usize, 8, 64] {
        let runs = make_runs(inputs, 16_384 / inputs);
        group.bench_with_input(BenchmarkId::from_parameter(inputs), &runs, |b, runs| {
            b.iter(|| {
                let mut sink = CollectSink::new();
                op.execute(sources(runs), &mut sink, &CancelToken::new())
                    .unwrap();
                sink.rows.len()
            })
        });
    }
    group.finish();
}

fn bench_two_key_compare(c: &mut Criterion) {
    let op = SortedMerge::new(KeySpec::new(vec![
        SortKey::asc("payload"),
        SortKey::desc("k"),
    ]))
    .with_check_sorted(true);
    let mut runs = make_runs(4, 4096);
    for run in &mut runs {
        run.sort_by(|a, b| match (a.get(1), b.get(1)) {
            (Some(Scalar::Str(x)), Some(Scalar::Str(y))) => x.cmp(y),
            _ => std::cmp::Ordering::Equal,
        });
    }
    c.bench_function("sorted_merge_checked_string_keys", |b| {
        b.iter(|| {
            let mut sink = CollectSink::new();
            op.execute(sources(&runs), &mut sink, &CancelToken::new())
                .unwrap();
        })
    });
}

criterion_group!(benches, bench_k_way_merge, bench_two_key_compare);
criterion_main!(benches);
