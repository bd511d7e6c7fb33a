//! Benchmarks for batch planning and result assembly
//!
//! This benchmark measures:
//! - Splitting a drained queue into index-tagged chunks
//! - Wire encoding of one chunk's operations
//! - Mapping a raw chunk response back onto its operations

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use graph_batch_rust::batch::{split, Args, BatchOperation, HttpVerb, ResultAssembler};
use graph_batch_rust::types::RawResult;

fn operations(n: usize) -> Vec<BatchOperation> {
    (0..n)
        .map(|i| {
            let mut args = Args::new();
            args.insert("fields".into(), serde_json::json!("id,name"));
            args.insert("limit".into(), serde_json::json!(25));
            BatchOperation::new(format!("{}/feed", i), HttpVerb::Get, "bench-token").with_args(args)
        })
        .collect()
}

fn raw_entries(n: usize) -> Option<Vec<Option<RawResult>>> {
    Some(
        (0..n)
            .map(|i| {
                Some(
                    RawResult::new(
                        200,
                        serde_json::json!({
                            "data": [{"id": i.to_string(), "name": "post"}],
                            "paging": {"next": format!("https://graph.example.com/v1/{}/feed?after=x", i)}
                        })
                        .to_string(),
                    )
                    .with_header("Content-Type", "application/json"),
                )
            })
            .collect(),
    )
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");

    for n in [10usize, 100, 1000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("operations", n), &n, |b, &n| {
            b.iter_batched(
                || operations(n),
                |ops| split(black_box(ops), 10),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let ops = operations(10);
    c.bench_function("to_batch_params/chunk_of_10", |b| {
        b.iter(|| {
            ops.iter()
                .map(|op| op.to_batch_params(black_box("bench-token")))
                .collect::<Vec<_>>()
        })
    });
}

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");
    let ops = operations(10);

    group.throughput(Throughput::Elements(10));
    group.bench_function("chunk_of_10", |b| {
        b.iter_batched(
            || raw_entries(10),
            |raw| ResultAssembler::assemble(black_box(&ops), raw),
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_split, bench_encode, bench_assemble);
criterion_main!(benches);
